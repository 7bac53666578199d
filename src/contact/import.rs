use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::from_str;

use crate::contact::{parse_date, NewContact};

/// Reads contact drafts from a TOML file containing a `[[contacts]]` array.
///
/// Relative picture paths are resolved against the directory containing the file.
pub fn read(path: &Path) -> Result<Vec<Result<NewContact>>> {
    let contents = read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));

    parse(&contents, base)
}

fn parse(contents: &str, base: &Path) -> Result<Vec<Result<NewContact>>> {
    let contents = from_str::<FileContents>(contents)?;

    let drafts = contents
        .contacts
        .into_iter()
        .map(|contact| contact.into_draft(base))
        .collect();

    Ok(drafts)
}

#[derive(Deserialize)]
struct FileContents {
    contacts: Vec<ImportedContact>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportedContact {
    first_name: String,
    last_name: Option<String>,
    date_of_birth: Option<String>,
    #[serde(default)]
    phone_numbers: Vec<String>,
    #[serde(default)]
    email_addresses: Vec<String>,
    #[serde(default)]
    addresses: Vec<String>,
    profile_picture: Option<PathBuf>,
}

impl ImportedContact {
    fn into_draft(self, base: &Path) -> Result<NewContact> {
        let date_of_birth = self.date_of_birth.as_deref().map(parse_date).transpose()?;

        let profile_picture = match self.profile_picture {
            Some(path) => {
                let path = base.join(path);

                let picture = std::fs::read(&path)
                    .with_context(|| format!("Failed to read picture {}", path.display()))?;

                Some(picture)
            }
            None => None,
        };

        Ok(NewContact {
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            phone_numbers: self.phone_numbers,
            email_addresses: self.email_addresses,
            addresses: self.addresses,
            profile_picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::write;

    #[test]
    fn drafts_are_parsed_individually() {
        let drafts = parse(
            r#"
[[contacts]]
first_name = "Amy"
last_name = "Pond"
date_of_birth = "1989-06-12"
phone_numbers = ["555-0100"]

[[contacts]]
first_name = "Rory"
date_of_birth = "yesterday"
"#,
            Path::new(""),
        )
        .unwrap();

        assert_eq!(drafts.len(), 2);

        let amy = drafts[0].as_ref().unwrap();
        assert_eq!(amy.first_name, "Amy");
        assert_eq!(amy.last_name.as_deref(), Some("Pond"));
        assert!(amy.date_of_birth.is_some());
        assert_eq!(amy.phone_numbers, ["555-0100"]);

        assert!(drafts[1].is_err());
    }

    #[test]
    fn pictures_are_read_relative_to_the_file() {
        let tmp = tempfile::tempdir().unwrap();

        write(tmp.path().join("amy.png"), b"picture").unwrap();
        write(
            tmp.path().join("contacts.toml"),
            "[[contacts]]\nfirst_name = \"Amy\"\nprofile_picture = \"amy.png\"\n",
        )
        .unwrap();

        let drafts = read(&tmp.path().join("contacts.toml")).unwrap();

        let amy = drafts.into_iter().next().unwrap().unwrap();
        assert_eq!(amy.profile_picture.as_deref(), Some(&b"picture"[..]));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        parse("[[contacts]]\nfirst_name = \"Amy\"\nnickname = \"Pond\"\n", Path::new(""))
            .unwrap_err();
    }
}
