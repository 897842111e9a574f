//! Deterministic object-store keys for a release
//!
//! Layout under the bucket:
//! - {account}/{project}/{config}/lock → deployment lock marker
//! - {account}/{project}/{config}/halt → halt marker
//! - {account}/{project}/{config}/{release_id}/release → canonical release document
//! - {account}/{project}/{config}/{release_id}/userdata → raw payload bytes

use crate::error::{Result, ValidationError};
use crate::models::Release;

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingAttribute(field)),
    }
}

impl Release {
    fn root_path(&self) -> Result<String> {
        Ok(format!(
            "{}/{}/{}",
            required(&self.aws_account_id, "AwsAccountID")?,
            required(&self.project_name, "ProjectName")?,
            required(&self.config_name, "ConfigName")?
        ))
    }

    fn release_root(&self) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.root_path()?,
            required(&self.release_id, "ReleaseID")?
        ))
    }

    pub fn lock_path(&self) -> Result<String> {
        Ok(format!("{}/lock", self.root_path()?))
    }

    pub fn halt_path(&self) -> Result<String> {
        Ok(format!("{}/halt", self.root_path()?))
    }

    pub fn release_path(&self) -> Result<String> {
        Ok(format!("{}/release", self.release_root()?))
    }

    pub fn user_data_path(&self) -> Result<String> {
        Ok(format!("{}/userdata", self.release_root()?))
    }

    pub(crate) fn bucket_name(&self) -> Result<&str> {
        required(&self.bucket, "Bucket")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> Release {
        Release {
            aws_account_id: Some("123456789012".to_string()),
            project_name: Some("checkout".to_string()),
            config_name: Some("prod".to_string()),
            release_id: Some("r-2024".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_paths() {
        let release = release();
        assert_eq!(release.lock_path().unwrap(), "123456789012/checkout/prod/lock");
        assert_eq!(release.halt_path().unwrap(), "123456789012/checkout/prod/halt");
        assert_eq!(
            release.release_path().unwrap(),
            "123456789012/checkout/prod/r-2024/release"
        );
        assert_eq!(
            release.user_data_path().unwrap(),
            "123456789012/checkout/prod/r-2024/userdata"
        );
    }

    #[test]
    fn test_lock_path_does_not_need_release_id() {
        let mut release = release();
        release.release_id = None;
        assert!(release.lock_path().is_ok());
        assert!(matches!(
            release.release_path(),
            Err(ValidationError::MissingAttribute("ReleaseID"))
        ));
    }

    #[test]
    fn test_missing_root_component() {
        let mut release = release();
        release.config_name = Some(String::new());
        assert!(matches!(
            release.halt_path(),
            Err(ValidationError::MissingAttribute("ConfigName"))
        ));
    }
}
