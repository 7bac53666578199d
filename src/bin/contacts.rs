use std::fs::{create_dir_all, read};
use std::path::PathBuf;

use anyhow::Result;
use cap_std::{ambient_authority, fs::Dir};
use clap::{Parser, Subcommand};
use serde::Serialize;
use time::Date;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contact_book::{
    book::AddressBook,
    config::Config,
    contact::{import, parse_date, ContactId, EntryKind, NewContact, Update},
    data_path_from_env,
    error::ContactError,
    store::DirStore,
};

#[derive(Parser)]
#[command(name = "contacts")]
#[command(about = "Address book grouped by the first letter of each name")]
#[command(
    after_help = "<ID> may be any unique prefix of a contact id.\n\nEnvironment:\n  DATA_PATH   Directory holding the contacts and config.toml\n  RUST_LOG    Log filter"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all contacts section by section
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the details of one contact
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a contact and print its id
    Add {
        first_name: String,
        last_name: Option<String>,
    },
    SetFirstName {
        id: String,
        name: String,
    },
    /// Set the last name, or clear it if omitted
    SetLastName {
        id: String,
        name: Option<String>,
    },
    /// Set the date of birth as YYYY-MM-DD, or clear it if omitted
    SetDob {
        id: String,
        #[arg(value_parser = parse_date)]
        date: Option<Date>,
    },
    AddEntry {
        #[arg(value_enum)]
        kind: EntryKind,
        id: String,
        value: String,
    },
    ReplaceEntry {
        #[arg(value_enum)]
        kind: EntryKind,
        id: String,
        old: String,
        new: String,
    },
    DeleteEntry {
        #[arg(value_enum)]
        kind: EntryKind,
        id: String,
        value: String,
    },
    /// Use the given image file as profile picture
    SetPicture {
        id: String,
        path: PathBuf,
    },
    ClearPicture {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Create contacts from a TOML file
    Import {
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_path = data_path_from_env()?;
    create_dir_all(&data_path)?;

    let dir = Dir::open_ambient_dir(&data_path, ambient_authority())?;

    let config = Config::read(&dir)?;

    let mut book = AddressBook::open(DirStore::open(&dir)?)?;

    run(&mut book, &config, cli.command)
}

fn run(book: &mut AddressBook<DirStore>, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::List { json } => list(book, json),
        Command::Show { id, json } => show(book, config, &id, json),
        Command::Add {
            first_name,
            last_name,
        } => add(book, first_name, last_name),
        Command::SetFirstName { id, name } => update(book, &id, Update::FirstName(name)),
        Command::SetLastName { id, name } => update(book, &id, Update::LastName(name)),
        Command::SetDob { id, date } => update(book, &id, Update::DateOfBirth(date)),
        Command::AddEntry { kind, id, value } => entry(book, &id, |book, id| {
            book.add_entry(id, kind, value).map(|_| ())
        }),
        Command::ReplaceEntry { kind, id, old, new } => entry(book, &id, |book, id| {
            book.replace_entry(id, kind, old, new).map(|_| ())
        }),
        Command::DeleteEntry { kind, id, value } => entry(book, &id, |book, id| {
            book.delete_entry(id, kind, &value).map(|_| ())
        }),
        Command::SetPicture { id, path } => {
            let id = book.find(&id)?;
            let picture = read(path)?;

            book.set_profile_picture(id, Some(picture))?;

            Ok(())
        }
        Command::ClearPicture { id } => update(book, &id, Update::ProfilePicture(None)),
        Command::Delete { id } => {
            let id = book.find(&id)?;
            let contact = book.delete(id)?;

            println!("Deleted {}", contact.display_name());

            Ok(())
        }
        Command::Import { path } => {
            let drafts = import::read(&path)?;

            let (count, failed) = book.import(drafts);

            println!("Imported {} out of {} contacts", count - failed, count);

            Ok(())
        }
    }
}

fn entry<F>(book: &mut AddressBook<DirStore>, id: &str, action: F) -> Result<()>
where
    F: FnOnce(&mut AddressBook<DirStore>, ContactId) -> Result<(), ContactError>,
{
    let id = book.find(id)?;

    match action(book, id) {
        Err(ContactError::DuplicateEntry { kind, value }) => {
            tracing::warn!("Discarding {} {:?} which already exists", kind, value);

            Ok(())
        }
        res => Ok(res?),
    }
}

#[derive(Serialize)]
struct Section<'a> {
    key: char,
    rows: Vec<Row<'a>>,
}

#[derive(Serialize)]
struct Row<'a> {
    id: ContactId,
    display_name: String,
    first_name: &'a str,
    last_name: Option<&'a str>,
}

fn list(book: &AddressBook<DirStore>, json: bool) -> Result<()> {
    let index = book.index();

    let sections = index
        .section_keys()
        .into_iter()
        .map(|key| Section {
            key,
            rows: index
                .rows(key)
                .map(|(display_name, contact)| Row {
                    id: contact.id,
                    display_name,
                    first_name: &contact.first_name,
                    last_name: contact.last_name.as_deref(),
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    for section in sections {
        println!("{}", section.key);

        for row in section.rows {
            println!("  {:.8}  {}", row.id.to_string(), row.display_name);
        }
    }

    Ok(())
}

fn show(book: &AddressBook<DirStore>, config: &Config, id: &str, json: bool) -> Result<()> {
    let id = book.find(id)?;
    let profile = book.get(id)?.profile(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", profile.display_name);
    println!("  Id: {}", profile.id);

    if let Some(date_of_birth) = &profile.date_of_birth {
        println!("  Date of Birth: {}", date_of_birth);
    }

    for (kind, entries) in [
        (EntryKind::Phone, &profile.phone_numbers),
        (EntryKind::Email, &profile.email_addresses),
        (EntryKind::Address, &profile.addresses),
    ] {
        for entry in entries {
            println!("  {}: {}", kind.label(), entry);
        }
    }

    if let Some(size) = profile.profile_picture {
        println!("  Picture: {} bytes", size);
    }

    Ok(())
}

fn add(
    book: &mut AddressBook<DirStore>,
    first_name: String,
    last_name: Option<String>,
) -> Result<()> {
    let mut draft = NewContact::new(first_name);
    draft.last_name = last_name;

    let id = book.create(draft)?;

    println!("{}", id);

    Ok(())
}

fn update(book: &mut AddressBook<DirStore>, id: &str, update: Update) -> Result<()> {
    let id = book.find(id)?;

    let contact = book.update(id, update)?;

    tracing::debug!("Updated {}", contact.display_name());

    Ok(())
}
