//! Account settings for the signed-in operator.

use serde_json::json;
use smartticket_core::validate;
use smartticket_core::{Collection, ProfileUpdate, UserRecord};
use smartticket_store::{Fields, get_record};
use tracing::info;

use crate::console::{Console, Upload};
use crate::error::ConsoleError;
use crate::users::picture_dir;

impl Console {
    /// Shows `No user is logged in.` when there is no session.
    async fn require_login(&self) -> Result<smartticket_store::Session, ConsoleError> {
        self.session().await.map_err(|e| {
            self.notifier().error("Error", "No user is logged in.");
            e
        })
    }

    pub async fn load_profile(&self) -> Result<UserRecord, ConsoleError> {
        let session = self.require_login().await?;
        let user: Option<UserRecord> = get_record(self.store(), &session.uid)
            .await
            .map_err(|e| self.fail("Could not load user data.", e.into()))?;
        user.ok_or_else(|| {
            let err = ConsoleError::Missing {
                what: "user",
                id: session.uid.clone(),
            };
            self.fail("Could not load user data.", err)
        })
    }

    /// Write the profile fields; the picture only changes when one is uploaded.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        picture: Option<Upload>,
    ) -> Result<UserRecord, ConsoleError> {
        let session = self.require_login().await?;
        update.validate().map_err(|e| self.invalid(e.into()))?;

        let result = async {
            let mut fields = Fields::new();
            fields.insert("firstName".into(), json!(update.first_name.trim()));
            fields.insert("lastName".into(), json!(update.last_name.trim()));
            fields.insert("birthdate".into(), json!(update.birthdate.trim()));
            fields.insert("gender".into(), json!(update.gender.trim()));
            fields.insert("address".into(), json!(update.address.trim()));
            if let Some(url) = self.upload(&picture_dir(&session.uid), picture).await? {
                fields.insert("profilePicture".into(), json!(url));
            }
            self.store()
                .update(Collection::Users, &session.uid, fields)
                .await?;
            Ok::<(), ConsoleError>(())
        }
        .await;
        result.map_err(|e| self.fail("There was an error updating your profile.", e))?;

        info!(uid = %session.uid, "profile updated");
        self.notifier()
            .success("Success!", "Profile updated successfully.");
        let user: Option<UserRecord> = get_record(self.store(), &session.uid).await?;
        user.ok_or(ConsoleError::Missing {
            what: "user",
            id: session.uid,
        })
    }

    /// Check the form, re-authenticate with the old password, then set the new one.
    pub async fn change_password(
        &self,
        old: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ConsoleError> {
        self.require_login().await?;
        if let Err(e) = validate::password_change(old, new, confirm) {
            return Err(self.invalid(e.into()));
        }
        match self.auth().change_password(old, new).await {
            Ok(()) => {
                info!("password changed");
                self.notifier()
                    .success("Success!", "Password changed successfully.");
                Ok(())
            }
            Err(e) => Err(self.fail("There was an error changing your password.", e.into())),
        }
    }
}
