//! Registered drivers page (data entry).

use serde_json::json;
use smartticket_core::{Collection, DriverForm, DriverRecord};
use smartticket_store::{Fields, create_record, get_record};
use tracing::info;

use crate::console::{Console, Outcome, Upload, View};
use crate::error::ConsoleError;

/// Blob directory for a driver's photos, keyed by upper-case license number.
pub fn image_dir(license_number: &str) -> String {
    format!("driverImages/{license_number}")
}

impl Console {
    pub async fn list_drivers(&self) -> Result<crate::Table, ConsoleError> {
        self.render(&View::Drivers).await
    }

    pub async fn add_driver(
        &self,
        form: DriverForm,
        photo: Option<Upload>,
    ) -> Result<Outcome, ConsoleError> {
        let form = form.validate().map_err(|e| self.invalid(e.into()))?;
        let table = self
            .apply_mutation(&View::Drivers, async {
                let url = self.upload(&image_dir(&form.license_number), photo).await?;
                let record = form.into_record(url.unwrap_or_default());
                let id = create_record(self.store(), &record).await?;
                info!(id = %id, license = %record.licensed_number, "added driver");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error adding the driver.", e))?;
        self.notifier()
            .success("Success!", "Driver has been added successfully.");
        Ok(Outcome::Reloaded(table))
    }

    pub async fn driver_edit_form(&self, id: &str) -> Result<DriverForm, ConsoleError> {
        let driver: DriverRecord = get_record(self.store(), id)
            .await?
            .ok_or_else(|| ConsoleError::Missing {
                what: "driver",
                id: id.to_string(),
            })?;
        Ok(DriverForm::from_record(&driver))
    }

    /// Rewrite the driver's details. The stored image is kept unless a new photo is given.
    pub async fn edit_driver(
        &self,
        id: &str,
        form: DriverForm,
        photo: Option<Upload>,
    ) -> Result<Outcome, ConsoleError> {
        let form = form.validate().map_err(|e| self.invalid(e.into()))?;
        if !self.notifier().confirm(
            "Are you sure?",
            "You are about to update this driver's information.",
        ) {
            return Ok(Outcome::Cancelled);
        }
        let table = self
            .apply_mutation(&View::Drivers, async {
                let mut fields = Fields::new();
                fields.insert("firstName".into(), json!(form.first_name));
                fields.insert("lastName".into(), json!(form.last_name));
                fields.insert("licensedNumber".into(), json!(form.license_number));
                fields.insert("address".into(), json!(form.address));
                fields.insert("sex".into(), json!(form.sex));
                if let Some(url) = self.upload(&image_dir(&form.license_number), photo).await? {
                    fields.insert("image".into(), json!(url));
                }
                self.store()
                    .update(Collection::RegisteredDrivers, id, fields)
                    .await?;
                info!(id, "updated driver");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error updating the driver.", e))?;
        self.notifier()
            .success("Updated!", "Driver data has been updated successfully.");
        Ok(Outcome::Reloaded(table))
    }

    pub async fn delete_driver(&self, id: &str) -> Result<Outcome, ConsoleError> {
        if !self
            .notifier()
            .confirm("Are you sure?", "You won't be able to revert this!")
        {
            return Ok(Outcome::Cancelled);
        }
        let table = self
            .apply_mutation(&View::Drivers, async {
                self.store()
                    .delete(Collection::RegisteredDrivers, id)
                    .await?;
                info!(id, "deleted driver");
                Ok(())
            })
            .await
            .map_err(|e| self.fail("There was an error deleting the driver.", e))?;
        self.notifier().success("Deleted!", "Driver has been deleted.");
        Ok(Outcome::Reloaded(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::fixture;
    use crate::dispatch::{ActionId, Dispatcher};
    use smartticket_store::list_records;

    fn form() -> DriverForm {
        DriverForm {
            first_name: "Maria".into(),
            last_name: "Reyes".into(),
            license_number: "n01-23-456789".into(),
            address: "Elm St".into(),
            sex: "Female".into(),
        }
    }

    async fn only_driver(store: &dyn smartticket_store::RecordStore) -> DriverRecord {
        let drivers: Vec<DriverRecord> = list_records(store).await.unwrap();
        assert_eq!(drivers.len(), 1);
        drivers.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn add_uppercases_license_and_stores_photo() {
        let fx = fixture(true);
        fx.console
            .add_driver(form(), Some(Upload::new("photo.png", vec![9])))
            .await
            .unwrap();
        let driver = only_driver(fx.store.as_ref()).await;
        assert_eq!(driver.licensed_number, "N01-23-456789");
        assert_eq!(driver.image, "memory://driverImages/N01-23-456789/photo.png");
        // Adding a driver does not ask for confirmation.
        assert!(fx.notifier.confirms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_keeps_old_image() {
        let fx = fixture(true);
        fx.console
            .add_driver(form(), Some(Upload::new("photo.png", vec![9])))
            .await
            .unwrap();
        let before = only_driver(fx.store.as_ref()).await;

        let mut edit = fx.console.driver_edit_form(&before.id).await.unwrap();
        edit.address = "Oak Ave".into();
        fx.console.edit_driver(&before.id, edit, None).await.unwrap();

        let after = only_driver(fx.store.as_ref()).await;
        assert_eq!(after.address, "Oak Ave");
        assert_eq!(after.image, before.image);
    }

    #[tokio::test]
    async fn delete_through_dispatch_table() {
        let fx = fixture(true);
        fx.console.add_driver(form(), None).await.unwrap();
        let table = fx.console.list_drivers().await.unwrap();
        let event = table.rows[0]
            .actions
            .iter()
            .find(|a| a.action == ActionId::DeleteDriver)
            .cloned()
            .unwrap();
        let outcome = Dispatcher::standard()
            .dispatch(&fx.console, event)
            .await
            .unwrap();
        match outcome {
            Outcome::Reloaded(table) => assert!(table.is_empty()),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            fx.notifier.last().unwrap().text,
            "Driver has been deleted."
        );
    }

    #[tokio::test]
    async fn edit_action_opens_prefilled_form() {
        let fx = fixture(true);
        fx.console.add_driver(form(), None).await.unwrap();
        let table = fx.console.list_drivers().await.unwrap();
        let event = table.rows[0].actions[0].clone();
        let outcome = Dispatcher::standard()
            .dispatch(&fx.console, event)
            .await
            .unwrap();
        match outcome {
            Outcome::EditDriver { form, .. } => assert_eq!(form.license_number, "N01-23-456789"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn declined_delete_keeps_driver() {
        let fx = fixture(false);
        fx.console.add_driver(form(), None).await.unwrap();
        let driver = only_driver(fx.store.as_ref()).await;
        let outcome = fx.console.delete_driver(&driver.id).await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(fx.store.count(Collection::RegisteredDrivers), 1);
    }
}
