//! Shipping address validation and the saved-address book.

use serde::Deserialize;
use tower_sessions::Session;

use crate::backend::types::Address;
use crate::models::session_keys;

/// Maximum saved addresses per session.
pub const MAX_SAVED_ADDRESSES: usize = 5;

/// Countries the brewery ships to.
pub const SHIPPING_COUNTRIES: [(&str, &str); 1] = [("US", "United States")];

/// Address form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AddressForm {
    /// Whether `code` is the selected country. A blank form defaults to US.
    #[must_use]
    pub fn is_country(&self, code: &str) -> bool {
        let selected = self.country.trim();
        if selected.is_empty() {
            code == "US"
        } else {
            selected.eq_ignore_ascii_case(code)
        }
    }

    /// Validate into an [`Address`], or list every problem.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn validate(&self) -> Result<Address, Vec<String>> {
        let mut errors = Vec::new();
        let required = [
            ("Full name", &self.full_name),
            ("Address", &self.line1),
            ("City", &self.city),
            ("State", &self.region),
            ("ZIP code", &self.postal_code),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("{label} is required"));
            }
        }

        let country = optional(&self.country).map_or_else(|| "US".to_string(), |c| c.to_uppercase());
        if !SHIPPING_COUNTRIES.iter().any(|(code, _)| *code == country) {
            errors.push("We can only ship within the United States".to_string());
        }

        let postal_code = self.postal_code.trim();
        if !postal_code.is_empty() && !is_us_zip(postal_code) {
            errors.push("ZIP code must be 5 digits (or ZIP+4)".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Address {
            full_name: self.full_name.trim().to_string(),
            line1: self.line1.trim().to_string(),
            line2: optional(&self.line2),
            city: self.city.trim().to_string(),
            region: self.region.trim().to_uppercase(),
            postal_code: postal_code.to_string(),
            country,
            phone: optional(&self.phone),
        })
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone().unwrap_or_default(),
            city: address.city.clone(),
            region: address.region.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone: address.phone.clone().unwrap_or_default(),
        }
    }
}

fn is_us_zip(value: &str) -> bool {
    let (zip, plus4) = value.split_once('-').unwrap_or((value, ""));
    zip.len() == 5
        && zip.chars().all(|c| c.is_ascii_digit())
        && (plus4.is_empty() || (plus4.len() == 4 && plus4.chars().all(|c| c.is_ascii_digit())))
        && (value.contains('-') == !plus4.is_empty())
}

/// Put `address` at the front of the book, without duplicates.
pub fn remember(book: &mut Vec<Address>, address: Address) {
    book.retain(|a| *a != address);
    book.insert(0, address);
    book.truncate(MAX_SAVED_ADDRESSES);
}

/// Saved addresses for this session.
pub async fn load(session: &Session) -> Vec<Address> {
    session
        .get(session_keys::SAVED_ADDRESSES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Save an address to the book.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save(session: &Session, address: Address) -> Result<(), tower_sessions::session::Error> {
    let mut book = load(session).await;
    remember(&mut book, address);
    session.insert(session_keys::SAVED_ADDRESSES, book).await
}

/// Delete the address at `index`. Returns whether one was removed.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn delete(session: &Session, index: usize) -> Result<bool, tower_sessions::session::Error> {
    let mut book = load(session).await;
    if index >= book.len() {
        return Ok(false);
    }
    book.remove(index);
    session.insert(session_keys::SAVED_ADDRESSES, book).await?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            full_name: " Ada Lovelace ".to_string(),
            line1: "1 Main St".to_string(),
            line2: String::new(),
            city: "Portland".to_string(),
            region: "or".to_string(),
            postal_code: "97209".to_string(),
            country: String::new(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_valid_form() {
        let address = form().validate().unwrap();
        assert_eq!(address.full_name, "Ada Lovelace");
        assert_eq!(address.region, "OR");
        assert_eq!(address.country, "US");
        assert_eq!(address.line2, None);
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = AddressForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_zip_formats() {
        assert!(is_us_zip("97209"));
        assert!(is_us_zip("97209-1234"));
        assert!(!is_us_zip("9720"));
        assert!(!is_us_zip("97209-"));
        assert!(!is_us_zip("ABCDE"));
    }

    #[test]
    fn test_rejects_foreign_country() {
        let mut f = form();
        f.country = "ca".to_string();
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_book_dedupes_and_caps() {
        let base = form().validate().unwrap();
        let mut book = Vec::new();
        for i in 0..7 {
            let mut a = base.clone();
            a.line1 = format!("{i} Main St");
            remember(&mut book, a);
        }
        assert_eq!(book.len(), MAX_SAVED_ADDRESSES);
        assert_eq!(book.first().unwrap().line1, "6 Main St");

        let again = book.get(2).unwrap().clone();
        remember(&mut book, again.clone());
        assert_eq!(book.len(), MAX_SAVED_ADDRESSES);
        assert_eq!(book.first().unwrap(), &again);
    }
}
