//! Organizations, email domains and users.

use chrono::Utc;
use loris_model::{NewUser, Organization, OrganizationEmailDomain, OrganizationUser, normalize_domain};

use crate::rows::{self, AUDIT_COLUMNS};
use crate::{Database, DbError};

/// Message returned when no organization owns a new user's email domain.
const NO_ORGANIZATION_FOR_DOMAIN: &str = "Organization does not exist for given Email Domain!";

/// Options for [`Database::create_user`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCreateOptions {
    /// Create a non-superuser without resolving its organization.
    pub ignore_email_domain_check: bool,
}

impl Database {
    pub async fn create_organization(&self, name: &str, actor: i64) -> Result<Organization, DbError> {
        Organization::validate_name(name)?;
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO organizations (name, is_active, {AUDIT_COLUMNS}) \
             VALUES (?, 1, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(name)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rows::organization(&row)?)
    }

    pub async fn get_organization(&self, id: i64) -> Result<Organization, DbError> {
        let row = sqlx::query("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("organization", id))?;
        Ok(rows::organization(&row)?)
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>, DbError> {
        let rows = sqlx::query("SELECT * FROM organizations ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows::collect(&rows, rows::organization)?)
    }

    pub async fn set_organization_active(
        &self,
        id: i64,
        is_active: bool,
        actor: i64,
    ) -> Result<Organization, DbError> {
        let row = sqlx::query(
            "UPDATE organizations SET is_active = ?, updated_by = ?, updated_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(is_active)
        .bind(actor)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("organization", id))?;
        Ok(rows::organization(&row)?)
    }

    /// Register an email domain for an organization.
    ///
    /// Domains are stored lower-cased and may belong to one organization only.
    pub async fn add_email_domain(
        &self,
        organization_id: i64,
        domain: &str,
        actor: i64,
    ) -> Result<OrganizationEmailDomain, DbError> {
        let domain = normalize_domain(domain)?;
        self.get_organization(organization_id).await?;
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO organization_email_domains (organization_id, domain, {AUDIT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        ))
        .bind(organization_id)
        .bind(&domain)
        .bind(actor)
        .bind(actor)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_conflict(e, || format!("email domain {domain}")))?;
        Ok(rows::email_domain(&row)?)
    }

    pub async fn list_email_domains(
        &self,
        organization_id: i64,
    ) -> Result<Vec<OrganizationEmailDomain>, DbError> {
        let rows = sqlx::query(
            "SELECT * FROM organization_email_domains WHERE organization_id = ? ORDER BY domain",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows::collect(&rows, rows::email_domain)?)
    }

    /// Organization owning `domain`, if any.
    pub async fn find_organization_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<Organization>, DbError> {
        let row = sqlx::query(
            "SELECT o.* FROM organizations o \
             JOIN organization_email_domains d ON d.organization_id = o.id \
             WHERE d.domain = ?",
        )
        .bind(domain.to_ascii_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(rows::organization).transpose()?)
    }

    /// Create a user, assigning its organization from the email domain.
    ///
    /// Non-superusers always get staff access. Their organization is the
    /// one owning their email domain; when no organization owns it the user
    /// is refused with [`DbError::PermissionDenied`], unless
    /// `ignore_email_domain_check` is set.
    pub async fn create_user(
        &self,
        new_user: NewUser,
        options: UserCreateOptions,
    ) -> Result<OrganizationUser, DbError> {
        new_user.validate()?;

        let mut is_staff = new_user.is_staff;
        let mut organization_id = None;
        if new_user.is_superuser {
            tracing::warn!("Creating superuser: {}", new_user.username);
        } else {
            is_staff = true;
            if options.ignore_email_domain_check {
                tracing::warn!(
                    username = %new_user.username,
                    "Ignoring EMAIL DOMAIN check on user creation!"
                );
            } else {
                let organization = self
                    .find_organization_by_domain(new_user.email_domain())
                    .await?
                    .ok_or_else(|| DbError::PermissionDenied(NO_ORGANIZATION_FOR_DOMAIN.to_owned()))?;
                organization_id = Some(organization.id);
            }
        }

        let row = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, is_superuser, is_staff, \
             organization_id, date_joined) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.is_superuser)
        .bind(is_staff)
        .bind(organization_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::on_conflict(e, || format!("username {}", new_user.username)))?;
        Ok(rows::user(&row)?)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<OrganizationUser>, DbError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(rows::user).transpose()?)
    }

    /// Like [`Database::find_user_by_username`] but a missing user is an error.
    pub async fn require_user(&self, username: &str) -> Result<OrganizationUser, DbError> {
        self.find_user_by_username(username)
            .await?
            .ok_or_else(|| DbError::not_found("user", username))
    }
}
