//! User administration page.

use serde_json::json;
use smartticket_core::{Collection, NewUserForm, UserEdit, UserRecord};
use smartticket_store::{Fields, get_record, set_record};
use tracing::info;

use crate::console::{Console, Outcome, Upload, View};
use crate::error::ConsoleError;

/// Blob directory for a user's profile pictures.
pub fn picture_dir(uid: &str) -> String {
    format!("profilePictures/{uid}")
}

impl Console {
    pub async fn list_users(&self) -> Result<crate::Table, ConsoleError> {
        self.render(&View::Users).await
    }

    /// Create the login account, store the picture, then write the user document under the account id.
    pub async fn add_user(
        &self,
        form: NewUserForm,
        picture: Option<Upload>,
    ) -> Result<Outcome, ConsoleError> {
        form.validate().map_err(|e| self.invalid(e.into()))?;
        if !self
            .notifier()
            .confirm("Are you sure?", "You are about to add a new user.")
        {
            return Ok(Outcome::Cancelled);
        }

        let table = self
            .apply_mutation(&View::Users, async {
                let account = self.auth().create_account(&form.email, &form.password).await?;
                let url = self.upload(&picture_dir(&account.uid), picture).await?;
                let record = form.into_record(&account.uid, url.unwrap_or_default());
                set_record(self.store(), &record).await?;
                info!(uid = %account.uid, "added user");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error adding the user.", e))?;
        self.notifier()
            .success("Success!", "User has been added successfully.");
        Ok(Outcome::Reloaded(table))
    }

    /// Edit form pre-filled from the stored user.
    pub async fn user_edit_form(&self, id: &str) -> Result<UserEdit, ConsoleError> {
        let user: UserRecord = get_record(self.store(), id)
            .await?
            .ok_or_else(|| ConsoleError::Missing {
                what: "user",
                id: id.to_string(),
            })?;
        Ok(UserEdit::from_record(&user))
    }

    /// Update name, address, gender, and position; the picture only when a new one is given.
    pub async fn edit_user(
        &self,
        id: &str,
        edit: UserEdit,
        picture: Option<Upload>,
    ) -> Result<Outcome, ConsoleError> {
        edit.validate().map_err(|e| self.invalid(e.into()))?;
        if !self.notifier().confirm(
            "Are you sure?",
            "You are about to update this user's information.",
        ) {
            return Ok(Outcome::Cancelled);
        }

        let table = self
            .apply_mutation(&View::Users, async {
                let mut fields = Fields::new();
                fields.insert("firstName".into(), json!(edit.first_name.trim()));
                fields.insert("lastName".into(), json!(edit.last_name.trim()));
                fields.insert("address".into(), json!(edit.address.trim()));
                fields.insert("gender".into(), json!(edit.gender.trim()));
                fields.insert("position".into(), json!(edit.position.trim()));
                if let Some(url) = self.upload(&picture_dir(id), picture).await? {
                    fields.insert("profilePicture".into(), json!(url));
                }
                self.store().update(Collection::Users, id, fields).await?;
                info!(id, "updated user");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error updating the user.", e))?;
        self.notifier()
            .success("Updated!", "User data has been updated successfully.");
        Ok(Outcome::Reloaded(table))
    }

    /// Remove the user document. The login account is left in place.
    pub async fn delete_user(&self, id: &str) -> Result<Outcome, ConsoleError> {
        if !self
            .notifier()
            .confirm("Are you sure?", "You won't be able to revert this!")
        {
            return Ok(Outcome::Cancelled);
        }
        let table = self
            .apply_mutation(&View::Users, async {
                self.store().delete(Collection::Users, id).await?;
                info!(id, "deleted user");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error deleting the user.", e))?;
        self.notifier().success("Deleted!", "User has been deleted.");
        Ok(Outcome::Reloaded(table))
    }
}
