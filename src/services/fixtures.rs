//! Demo records
//!
//! Generates plausible LOM records from a seeded RNG so that the same seed
//! always yields the same ids, metadata and dates.

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};

use super::{Collection, Indexer, LomRecordsService, ServiceError};
use crate::types::{Identity, RecordId, RecordItem, ResourceType};

/// DOI prefix reserved for test registrations
pub const DEMO_DOI_PREFIX: &str = "10.5072";

const SUBJECTS: &[&str] = &[
    "Linear Algebra",
    "Organic Chemistry",
    "Medieval History",
    "Rust Programming",
    "Soil Mechanics",
    "Microeconomics",
    "Cell Biology",
    "Music Theory",
];

const FORMS: &[&str] = &[
    "Introduction to",
    "Advanced",
    "Exercises in",
    "Lecture Notes on",
    "A Primer on",
];

const KEYWORDS: &[&str] = &[
    "open educational resource",
    "lecture",
    "exercise",
    "video",
    "slides",
    "self-study",
    "assessment",
];

const GIVEN_NAMES: &[&str] = &["Anna", "Lukas", "Marie", "Jonas", "Sofia", "Elias", "Lena"];

const FAMILY_NAMES: &[&str] = &[
    "Gruber", "Huber", "Wagner", "Bauer", "Pichler", "Steiner", "Moser",
];

const ROLES: &[&str] = &["Author", "Editor", "Publisher"];

const LICENSES: &[&str] = &[
    "https://creativecommons.org/licenses/by/4.0/",
    "https://creativecommons.org/licenses/by-sa/4.0/",
    "https://creativecommons.org/publicdomain/zero/1.0/",
];

const LANGUAGES: &[&str] = &["en", "de"];

const RESOURCE_TYPES: &[ResourceType] = &[
    ResourceType::Course,
    ResourceType::Unit,
    ResourceType::File,
    ResourceType::Link,
    ResourceType::Upload,
];

const FILE_KINDS: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("mp4", "video/mp4"),
    ("html", "text/html"),
    ("txt", "text/plain"),
];

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    // Every list above is non-empty
    items.choose(rng).unwrap_or(&items[0])
}

fn langstring(text: &str, lang: &str) -> Value {
    json!({"langstring": {"#text": text, "lang": lang}})
}

fn vcard(fullname: &str) -> String {
    format!("BEGIN:VCARD\r\nVERSION:4.0\r\nFN:{}\r\nEND:VCARD\r\n", fullname)
}

/// One fake record document, not yet stored
pub fn fake_record(rng: &mut StdRng) -> Value {
    let id = RecordId::generate(rng);
    let resource_type = *pick(rng, RESOURCE_TYPES);
    let lang = *pick(rng, LANGUAGES);
    let subject = *pick(rng, SUBJECTS);
    let title = format!("{} {}", pick(rng, FORMS), subject);

    let keyword_count = rng.gen_range(1..=3);
    let keywords: Vec<Value> = KEYWORDS
        .choose_multiple(rng, keyword_count)
        .map(|k| langstring(k, lang))
        .collect();

    let contribute: Vec<Value> = (0..rng.gen_range(1..=3))
        .map(|i| {
            let fullname = format!("{} {}", pick(rng, GIVEN_NAMES), pick(rng, FAMILY_NAMES));
            let role = if i == 0 { "Author" } else { *pick(rng, ROLES) };
            json!({
                "role": {
                    "source": langstring("LOMv1.0", "x-none"),
                    "value": langstring(role, "x-none"),
                },
                "entity": [vcard(&fullname)],
            })
        })
        .collect();

    let (extension, mimetype) = *pick(rng, FILE_KINDS);
    let file_key = format!("{}.{}", subject.to_lowercase().replace(' ', "_"), extension);
    let size: u64 = rng.gen_range(1_000..5_000_000);
    let location = format!("https://example.org/records/{}", id);

    let created = Utc
        .with_ymd_and_hms(2020, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        + Duration::days(rng.gen_range(0..1500))
        + Duration::minutes(rng.gen_range(0..600));
    let created = created.to_rfc3339();

    let files_access = if rng.gen_bool(0.8) {
        "public"
    } else {
        "restricted"
    };
    let license = *pick(rng, LICENSES);
    let mut entries = Map::new();
    entries.insert(
        file_key.clone(),
        json!({
            "key": file_key,
            "size": size,
            "mimetype": mimetype,
            "checksum": format!("md5:{:032x}", rng.gen_range(0..u128::MAX)),
        }),
    );

    let mut record = json!({
        "id": id.value(),
        "resource_type": resource_type.to_string(),
        "access": {
            "record": "public",
            "files": files_access,
        },
        "created": created,
        "updated": created,
        "files": {
            "enabled": true,
            "entries": entries,
        },
        "metadata": {
            "general": {
                "identifier": [],
                "title": langstring(&title, lang),
                "language": [lang],
                "description": [langstring(&format!("Learning materials on {}.", subject.to_lowercase()), lang)],
                "keyword": keywords,
            },
            "lifecycle": {
                "contribute": contribute,
            },
            "technical": {
                "format": [mimetype],
                "size": size,
                "location": {"type": "URL", "#text": location},
            },
            "educational": {
                "learningresourcetype": {
                    "source": "https://w3id.org/kim/hcrt/scheme",
                    "id": format!("https://w3id.org/kim/hcrt/{}", resource_type),
                },
            },
            "rights": {
                "copyrightandotherrestrictions": {
                    "source": langstring("LOMv1.0", "x-none"),
                    "value": langstring("yes", "x-none"),
                },
                "url": license,
            },
        }
    });

    // Some records are published without a DOI
    if rng.gen_bool(0.8) {
        record["pids"] = json!({
            "doi": {
                "identifier": format!("{}/{}", DEMO_DOI_PREFIX, id),
                "provider": "datacite",
            }
        });
    }

    record
}

/// Create and publish `number` fake records
///
/// Ids come from the seeded generator too, so a seed always yields the same
/// ids. Generated records whose id is already stored (as record or draft) are
/// skipped; rerunning with the same seed publishes nothing new.
pub fn publish_fake_records<I: Indexer>(
    service: &LomRecordsService<I>,
    number: usize,
    seed: u64,
) -> Result<Vec<RecordItem>, ServiceError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let identity = Identity::system();
    let mut published = Vec::with_capacity(number);
    let mut skipped = 0;

    for _ in 0..number {
        let data = fake_record(&mut rng);
        let id = RecordId::from(data.get("id").and_then(Value::as_str).unwrap_or_default());
        if [Collection::Records, Collection::Drafts]
            .into_iter()
            .any(|collection| service.store().exists(collection, &id))
        {
            tracing::debug!("Skipping demo record '{}', already stored", id);
            skipped += 1;
            continue;
        }
        let draft = service.create_draft(&identity, data)?;
        published.push(service.publish(&identity, draft.id())?);
    }

    tracing::info!(
        "Published {} fake LOM records (seed {}, {} already present)",
        published.len(),
        seed,
        skipped
    );
    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LomMetadata;

    #[test]
    fn test_fake_record_is_seed_deterministic() {
        let first = fake_record(&mut StdRng::seed_from_u64(42));
        let second = fake_record(&mut StdRng::seed_from_u64(42));
        let other = fake_record(&mut StdRng::seed_from_u64(43));
        assert_eq!(first, second);
        assert_ne!(first["id"], other["id"]);
    }

    #[test]
    fn test_fake_record_shape() {
        let record = fake_record(&mut StdRng::seed_from_u64(1));
        let item = RecordItem::from_json(record).unwrap();
        let lom = LomMetadata::new(item.metadata());

        assert!(lom.title().is_some());
        assert!(!lom.authors().is_empty());
        assert_eq!(lom.authors()[0].role, "Author");
        assert!(lom.rights_url().is_some());
        assert_eq!(item.files().len(), 1);
        assert!(item.resource_type().is_some());
    }
}
