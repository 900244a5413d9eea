use anyhow::Context;
use atlas_authz::password::{hash_password, verify_password};
use time::OffsetDateTime;

use super::{required, RuleError, RuleResult, Rules, EMPTY_BODY};
use crate::modules::users::models::{
    Address, AddressInput, LoginRequest, LoginToken, RegisterUser, Title, User,
};
use crate::utils::new_id;
use crate::utils::validation::{
    is_valid_email, is_valid_mobile, is_valid_password, is_valid_pincode, is_valid_place,
    is_valid_string, non_blank,
};

const MISSING_FIELDS: &str = "Please provide all fields: title, name, phone, email and password.";
const NO_SUCH_USER: &str = "No such user exists. Please enter a valid email and password.";

impl Rules {
    /// Register a new account.
    pub async fn create_user(&self, payload: RegisterUser) -> RuleResult<User> {
        if payload.is_empty() {
            return Err(RuleError::invalid(EMPTY_BODY));
        }

        let title = required(payload.title.as_deref(), MISSING_FIELDS)?;
        let name = required(payload.name.as_deref(), MISSING_FIELDS)?;
        let phone = required(payload.phone.as_deref(), MISSING_FIELDS)?;
        let email = required(payload.email.as_deref(), MISSING_FIELDS)?;
        let password = required(payload.password.as_deref(), MISSING_FIELDS)?;

        let title: Title = title
            .parse()
            .map_err(|_| RuleError::invalid("Please use a valid title: Mr, Mrs or Miss."))?;
        if !is_valid_string(name) {
            return Err(RuleError::invalid("Name is not valid."));
        }
        if !is_valid_mobile(phone) {
            return Err(RuleError::invalid("Enter a valid 10 digit phone number."));
        }
        if !is_valid_email(email) {
            return Err(RuleError::invalid("Enter a valid email."));
        }
        if !is_valid_password(password) {
            return Err(RuleError::invalid(
                "Password must be 6 to 15 letters or digits.",
            ));
        }
        let address = payload.address.as_ref().map(validate_address).transpose()?;

        if self.users.find_by_phone_or_email(phone, email).await?.is_some() {
            return Err(RuleError::Conflict(
                "Email or phone number already exists.".to_string(),
            ));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")??;

        let now = OffsetDateTime::now_utc();
        let user = self
            .users
            .insert(User {
                id: new_id(),
                title,
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                password_hash,
                address,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair and issue a bearer token for it.
    pub async fn authenticate_user(&self, request: LoginRequest) -> RuleResult<LoginToken> {
        if request.is_empty() {
            return Err(RuleError::invalid(EMPTY_BODY));
        }

        let email = required(request.email.as_deref(), "Email and password are required.")?;
        let password = required(
            request.password.as_deref(),
            "Email and password are required.",
        )?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| RuleError::not_found(NO_SUCH_USER))?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("password verification task failed")?;
        if !matches {
            return Err(RuleError::not_found(NO_SUCH_USER));
        }

        let token = self.tokens.issue(&user.id)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginToken { token })
    }
}

fn validate_address(input: &AddressInput) -> RuleResult<Address> {
    const MESSAGE: &str = "Please provide a valid street, city and pincode.";

    let street = non_blank(input.street.as_deref()).filter(|s| is_valid_place(s));
    let city = non_blank(input.city.as_deref()).filter(|c| is_valid_place(c));
    let pincode = non_blank(input.pincode.as_deref()).filter(|p| is_valid_pincode(p));

    match (street, city, pincode) {
        (Some(street), Some(city), Some(pincode)) => Ok(Address {
            street: street.to_string(),
            city: city.to_string(),
            pincode: pincode.to_string(),
        }),
        _ => Err(RuleError::invalid(MESSAGE)),
    }
}
