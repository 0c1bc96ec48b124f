//! Registered drivers and console user accounts, with their form inputs.

use serde::{Deserialize, Serialize};

use crate::apprehension::null_as_default;
use crate::schema::{Collection, Entity};
use crate::validate::{self, FormError};

/// A licensed driver registered from the Data Entry page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    /// Always upper-case once written by the console.
    #[serde(default, deserialize_with = "null_as_default")]
    pub licensed_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sex: String,
    /// Download URL of the driver's photo; empty when none was uploaded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
}

impl DriverRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for DriverRecord {
    const COLLECTION: Collection = Collection::RegisteredDrivers;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Driver add/edit form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverForm {
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub address: String,
    pub sex: String,
}

impl DriverForm {
    pub fn from_record(driver: &DriverRecord) -> Self {
        Self {
            first_name: driver.first_name.clone(),
            last_name: driver.last_name.clone(),
            license_number: driver.licensed_number.clone(),
            address: driver.address.clone(),
            sex: driver.sex.clone(),
        }
    }

    /// Check required fields and normalise the license number to upper case.
    pub fn validate(&self) -> Result<DriverForm, FormError> {
        Ok(DriverForm {
            first_name: validate::required("firstName", &self.first_name)?.to_string(),
            last_name: validate::required("lastName", &self.last_name)?.to_string(),
            license_number: validate::required("licenseNumber", &self.license_number)?
                .to_uppercase(),
            address: validate::required("address", &self.address)?.to_string(),
            sex: validate::required("sex", &self.sex)?.to_string(),
        })
    }

    /// Build the stored record from a validated form and an image URL.
    pub fn into_record(self, image: String) -> DriverRecord {
        DriverRecord {
            id: String::new(),
            first_name: self.first_name,
            last_name: self.last_name,
            licensed_number: self.license_number,
            address: self.address,
            sex: self.sex,
            image,
        }
    }
}

/// A console user. The document id is the auth subject id and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub birthdate: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: String,
    /// Copy of the auth subject id, kept in the document body as well.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile_picture: String,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for UserRecord {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Add-user form: profile fields plus the credential to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUserForm {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub gender: String,
    pub address: String,
    pub position: String,
    pub email: String,
    pub password: String,
}

impl NewUserForm {
    pub fn validate(&self) -> Result<(), FormError> {
        validate::required("firstName", &self.first_name)?;
        validate::required("lastName", &self.last_name)?;
        validate::required("birthdate", &self.birthdate)?;
        validate::required("gender", &self.gender)?;
        validate::required("address", &self.address)?;
        validate::required("position", &self.position)?;
        validate::email("email", &self.email)?;
        validate::password("password", &self.password)?;
        Ok(())
    }

    /// The user document for a freshly created auth subject.
    pub fn into_record(self, uid: &str, profile_picture: String) -> UserRecord {
        UserRecord {
            id: uid.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            birthdate: self.birthdate,
            gender: self.gender,
            address: self.address,
            position: self.position,
            uid: uid.to_string(),
            profile_picture,
        }
    }
}

/// Edit-user form. Email and birthdate are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEdit {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub gender: String,
    pub position: String,
}

impl UserEdit {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            gender: user.gender.clone(),
            position: user.position.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        validate::required("editFirstName", &self.first_name)?;
        validate::required("editLastName", &self.last_name)?;
        validate::required("editAddress", &self.address)?;
        validate::required("editGender", &self.gender)?;
        validate::required("editPosition", &self.position)?;
        Ok(())
    }
}

/// Settings-page profile update for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub birthdate: String,
    pub gender: String,
    pub address: String,
}

impl ProfileUpdate {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birthdate: user.birthdate.clone(),
            gender: user.gender.clone(),
            address: user.address.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        validate::required("firstName", &self.first_name)?;
        validate::required("lastName", &self.last_name)?;
        validate::required("birthdate", &self.birthdate)?;
        validate::required("gender", &self.gender)?;
        validate::required("address", &self.address)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn driver_form() -> DriverForm {
        DriverForm {
            first_name: "Maria".into(),
            last_name: "Reyes".into(),
            license_number: "n01-23-456789".into(),
            address: "Elm St".into(),
            sex: "Female".into(),
        }
    }

    #[test]
    fn driver_license_is_uppercased() {
        let form = driver_form().validate().unwrap();
        assert_eq!(form.license_number, "N01-23-456789");
        let record = form.into_record(String::new());
        assert_eq!(record.licensed_number, "N01-23-456789");
        assert_eq!(record.full_name(), "Maria Reyes");
    }

    #[test]
    fn driver_form_requires_every_field() {
        let mut form = driver_form();
        form.sex = "  ".into();
        assert_eq!(
            form.validate(),
            Err(FormError::Required { field: "sex" })
        );
    }

    #[test]
    fn new_user_record_uses_uid_for_both_ids() {
        let form = NewUserForm {
            first_name: "Ana".into(),
            last_name: "Lim".into(),
            birthdate: "1990-01-01".into(),
            gender: "Female".into(),
            address: "Oak Ave".into(),
            position: "Enforcer".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
        };
        form.validate().unwrap();
        let record = form.into_record("uid-1", String::new());
        assert_eq!(record.id, "uid-1");
        assert_eq!(record.uid, "uid-1");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["uid"], json!("uid-1"));
        assert_eq!(value["profilePicture"], json!(""));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn new_user_rejects_bad_email() {
        let form = NewUserForm {
            first_name: "Ana".into(),
            last_name: "Lim".into(),
            birthdate: "1990-01-01".into(),
            gender: "Female".into(),
            address: "Oak Ave".into(),
            position: "Enforcer".into(),
            email: "not-an-email".into(),
            password: "secret1".into(),
        };
        assert_eq!(
            form.validate(),
            Err(FormError::InvalidEmail { field: "email" })
        );
    }

    #[test]
    fn driver_decodes_with_missing_image() {
        let d: DriverRecord = serde_json::from_value(json!({
            "firstName": "Jose",
            "lastName": "Rizal",
            "licensedNumber": "A12",
            "address": null,
            "sex": "Male"
        }))
        .unwrap();
        assert_eq!(d.image, "");
        assert_eq!(d.address, "");
    }
}
