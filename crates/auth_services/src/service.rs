use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::{
    AuthError, NotificationPreferences, SignUpRequest, UpdateProfileRequest, User,
    validate_phone_number,
};

const USER_COLUMNS: &str = r#"
    id, email, name, phone, password_hash, role,
    email_verified, phone_verified, notification_preferences,
    is_active, created_at, updated_at
"#;

/// A service for handling user authentication operations such as creating users,
/// retrieving user information, verifying credentials, and managing sessions.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database with the provided sign-up request.
    pub async fn create_user(&self, request: &SignUpRequest) -> Result<User, AuthError> {
        // Validate phone number format
        if !validate_phone_number(&request.phone) {
            return Err(AuthError::InvalidPhoneNumber);
        }

        // Check if email already exists
        let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(request.email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        if existing_user.is_some() {
            return Err(AuthError::EmailExists);
        }

        // Hash the password
        let password_hash = hash(&request.password, DEFAULT_COST)?;

        // Format phone number to E.164 format
        let formatted_phone = format_phone_number(&request.phone);

        let notification_prefs = serialize_preferences(&request.notification_preferences)?;

        // Insert the new user
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (
                email, name, phone, password_hash, notification_preferences
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.email.to_lowercase().trim())
        .bind(request.name.trim())
        .bind(&formatted_phone)
        .bind(&password_hash)
        .bind(&notification_prefs)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Retrieves a user by their email address, returning `None` if not found or inactive.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = true"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    /// Retrieves a user by their ID, returning `None` if not found or inactive.
    pub async fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = true"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    /// Verifies the user's password against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = verify(password, &user.password_hash)?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Creates a new session for the user with a refresh token hash
    pub async fn create_session(
        &self,
        user_id: &Uuid,
        refresh_token_hash: &str,
    ) -> Result<Uuid, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .bind(Utc::now() + chrono::Duration::days(30)) // 30 day expiry
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// Checks a presented refresh token against the user's stored session hashes.
    /// Returns the user when a live session matches.
    pub async fn validate_refresh_session(
        &self,
        user_id: &Uuid,
        refresh_token: &str,
    ) -> Result<User, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT refresh_token_hash FROM user_sessions
            WHERE user_id = $1 AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &rows {
            let stored_hash: String = row.get("refresh_token_hash");
            if verify(refresh_token, &stored_hash)? {
                return self
                    .get_user_by_id(user_id)
                    .await?
                    .ok_or(AuthError::UserNotFound);
            }
        }

        Err(AuthError::SessionExpired)
    }

    /// Deletes all of the user's sessions, signing them out everywhere.
    pub async fn revoke_sessions(&self, user_id: &Uuid) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Updates the user's email and/or phone verification status
    pub async fn update_user_verification(
        &self,
        user_id: &Uuid,
        email_verified: Option<bool>,
        phone_verified: Option<bool>,
    ) -> Result<(), AuthError> {
        if let Some(email_verified) = email_verified {
            sqlx::query("UPDATE users SET email_verified = $1, updated_at = NOW() WHERE id = $2")
                .bind(email_verified)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        }

        if let Some(phone_verified) = phone_verified {
            sqlx::query("UPDATE users SET phone_verified = $1, updated_at = NOW() WHERE id = $2")
                .bind(phone_verified)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Updates the user's profile information
    pub async fn update_user_profile(
        &self,
        user_id: &Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        // Get current user to compare changes
        let current_user = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Changing email or phone resets the matching verification flag
        let email_changed = current_user.email != request.email;
        let phone_changed = current_user.phone.as_deref() != Some(&request.phone);

        let new_email_verified = !email_changed && current_user.email_verified;
        let new_phone_verified = !phone_changed && current_user.phone_verified;

        let notification_prefs = serialize_preferences(&request.notification_preferences)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = $1,
                email = $2,
                phone = $3,
                email_verified = $4,
                phone_verified = $5,
                notification_preferences = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.name.trim())
        .bind(request.email.to_lowercase().trim())
        .bind(&request.phone)
        .bind(new_email_verified)
        .bind(new_phone_verified)
        .bind(&notification_prefs)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }
}

impl User {
    /// Converts the user's notification preferences from JSON to a structured type.
    pub fn to_notification_preferences(&self) -> Result<NotificationPreferences, AuthError> {
        serde_json::from_value(self.notification_preferences.clone()).map_err(|e| {
            AuthError::Validation(format!(
                "Invalid notification preferences in database: {}",
                e
            ))
        })
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        email_verified: row.get("email_verified"),
        phone_verified: row.get("phone_verified"),
        notification_preferences: row.get("notification_preferences"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn serialize_preferences(
    preferences: &NotificationPreferences,
) -> Result<serde_json::Value, AuthError> {
    serde_json::to_value(preferences)
        .map_err(|e| AuthError::Validation(format!("Invalid notification preferences: {}", e)))
}

fn format_phone_number(phone: &str) -> String {
    // Remove all non-digit characters
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Add +1 if it's a 10-digit US number
    if digits.len() == 10 {
        format!("+1{}", digits)
    } else {
        format!("+{}", digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ten_digit_numbers_as_us() {
        assert_eq!(format_phone_number("(555) 867-5309"), "+15558675309");
    }

    #[test]
    fn keeps_existing_country_codes() {
        assert_eq!(format_phone_number("1 555 867 5309"), "+15558675309");
    }
}
