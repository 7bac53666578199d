use anyhow::Result;
use serde::Serialize;

use crate::{
    config::Config,
    contact::{Contact, ContactId},
};

/// Detail view of a single contact with its entries sorted for display.
#[derive(Debug, Serialize)]
pub struct Profile<'a> {
    pub id: ContactId,
    pub display_name: String,
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub date_of_birth: Option<String>,
    pub phone_numbers: Vec<&'a str>,
    pub email_addresses: Vec<&'a str>,
    pub addresses: Vec<&'a str>,
    pub profile_picture: Option<usize>,
}

impl Contact {
    pub fn profile(&self, config: &Config) -> Result<Profile<'_>> {
        let date_of_birth = match self.date_of_birth {
            Some(date) => {
                let format = config.date_format()?;

                Some(date.format(&format[..])?)
            }
            None => None,
        };

        Ok(Profile {
            id: self.id,
            display_name: self.display_name(),
            first_name: &self.first_name,
            last_name: self.last_name.as_deref(),
            date_of_birth,
            phone_numbers: self.phone_numbers.sorted(),
            email_addresses: self.email_addresses.sorted(),
            addresses: self.addresses.sorted(),
            profile_picture: self.profile_picture.as_ref().map(Vec::len),
        })
    }
}
