//! Organizations, their email domains, and organization users.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Audit, ModelError, validate_length};

/// An organization owning users and static sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub audit: Audit,
}

impl Organization {
    pub fn validate_name(name: &str) -> Result<(), ModelError> {
        validate_length("organization.name", name, 1, 150)
    }
}

impl std::fmt::Display for Organization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Organization({})", self.name)
    }
}

/// An email domain whose users belong to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationEmailDomain {
    pub id: i64,
    pub organization_id: i64,
    /// Lower-cased domain, e.g. `example.com`.
    pub domain: String,
    pub audit: Audit,
}

/// Normalize and validate an email domain for storage and lookup.
pub fn normalize_domain(domain: &str) -> Result<String, ModelError> {
    let domain = domain.trim().trim_start_matches('@').to_ascii_lowercase();
    validate_length("email_domain.domain", &domain, 1, 150)?;
    if domain.contains('@') || domain.contains(char::is_whitespace) {
        return Err(ModelError::Invalid {
            field: "email_domain.domain",
            message: format!("not a domain: {domain}"),
        });
    }
    Ok(domain)
}

/// A CMS user, optionally attached to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub organization_id: Option<i64>,
    pub date_joined: DateTime<Utc>,
}

impl OrganizationUser {
    /// Domain part of the email address (`NAME@DOMAIN.COM` → `DOMAIN.COM`).
    pub fn email_domain(&self) -> &str {
        email_domain(&self.email)
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_staff: bool,
}

impl NewUser {
    pub fn email_domain(&self) -> &str {
        email_domain(&self.email)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_length("user.username", &self.username, 1, 150)?;
        validate_length("user.email", &self.email, 3, 254)?;
        if !self.email.contains('@') {
            return Err(ModelError::Invalid {
                field: "user.email",
                message: format!("not an email address: {}", self.email),
            });
        }
        validate_length("user.first_name", &self.first_name, 0, 150)?;
        validate_length("user.last_name", &self.last_name, 0, 150)?;
        Ok(())
    }
}

fn email_domain(email: &str) -> &str {
    email.rsplit('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> OrganizationUser {
        OrganizationUser {
            id: 1,
            username: "jdoe".to_owned(),
            email: email.to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            is_superuser: false,
            is_staff: true,
            organization_id: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(user("jane@example.com").email_domain(), "example.com");
        assert_eq!(user("odd@name@corp.jp").email_domain(), "corp.jp");
        assert_eq!(user("no-at-sign").email_domain(), "no-at-sign");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("jane@example.com").display_name(), "Doe, Jane");
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" @Example.COM ").unwrap(), "example.com");
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain("a@b.com").is_err());
    }

    #[test]
    fn test_organization_display() {
        let org = Organization {
            id: 1,
            name: "Loris Lab".to_owned(),
            is_active: true,
            audit: Audit::created_now(1),
        };
        assert_eq!(org.to_string(), "Organization(Loris Lab)");
    }

    #[test]
    fn test_new_user_requires_email() {
        let new_user = NewUser {
            username: "jdoe".to_owned(),
            email: "jdoe".to_owned(),
            ..NewUser::default()
        };
        assert!(new_user.validate().is_err());
    }
}
