//! Cross-module pipeline properties that need no live browser:
//! the pure halves of extraction feeding the merge, and the
//! translation layer in its degraded mode.

use idus_translator::extract::images::canonicalize;
use idus_translator::extract::options::parse_panel_texts;
use idus_translator::extract::{embedded, merge};
use idus_translator::product::{OptionGroup, PartialRecord, TargetLocale, NO_ARTIST, NO_DESCRIPTION};
use idus_translator::translate::prompts::PromptKind;
use idus_translator::Translator;
use serde_json::json;

#[test]
fn embedded_payload_flows_through_merge_unchanged() {
    let payload = json!({
        "product": {
            "title": "Hand-carved Wooden Spoon",
            "price": 18000
        }
    });

    let embedded = embedded::from_payload(&payload);
    let record = merge("https://www.idus.com/v2/product/abc", embedded, PartialRecord::default());

    assert_eq!(record.title, "Hand-carved Wooden Spoon");
    assert_eq!(record.price, "18,000원");
    // untouched fields are sentinel-backed, never empty
    assert_eq!(record.artist_name, NO_ARTIST);
    assert_eq!(record.description, NO_DESCRIPTION);
}

#[test]
fn harvested_panel_and_collected_images_land_in_the_record() {
    let panel = vec!["1. Flavor\nA\nB\n2. Size\nS\nM".to_string()];
    let options = parse_panel_texts(&panel);

    let images = canonicalize(vec![
        "https://image.idus.com/image/files/abc123_100.jpg".to_string(),
        "https://image.idus.com/image/files/abc123_720.jpg".to_string(),
        "https://image.idus.com/image/files/def456_800.jpg".to_string(),
    ]);

    let dom = PartialRecord { options, images, ..Default::default() };
    let record = merge("https://www.idus.com/v2/product/abc", PartialRecord::default(), dom);

    assert_eq!(
        record.options,
        vec![
            OptionGroup { name: "Flavor".to_string(), values: vec!["A".to_string(), "B".to_string()] },
            OptionGroup { name: "Size".to_string(), values: vec!["S".to_string(), "M".to_string()] },
        ]
    );
    assert_eq!(
        record.images,
        vec![
            "https://image.idus.com/image/files/abc123_720.jpg",
            "https://image.idus.com/image/files/def456_800.jpg",
        ]
    );
}

#[test]
fn canonicalization_is_stable_across_repeated_runs() {
    let input: Vec<String> = vec![
        "https://image.idus.com/image/files/aaa111_400.jpg".to_string(),
        "https://image.idus.com/image/files/bbb222_720.jpg".to_string(),
        "https://image.idus.com/image/files/aaa111_800.jpg".to_string(),
        "https://www.idus.com/static/detail.jpg".to_string(),
    ];

    let first = canonicalize(input.clone());
    let second = canonicalize(input);
    let again = canonicalize(first.clone());

    assert_eq!(first, second);
    assert_eq!(first, again);
}

#[tokio::test]
async fn degraded_translator_round_trips_a_full_record() {
    let payload = json!({
        "product": {
            "title": "수제 가죽 지갑",
            "artistName": "가죽공방",
            "price": 45000
        }
    });
    let record = merge(
        "https://www.idus.com/v2/product/abc",
        embedded::from_payload(&payload),
        PartialRecord::default(),
    );

    let translator = Translator::disabled();
    let translated = translator.translate_product(&record, TargetLocale::Ja).await;

    assert_eq!(translated.original, record);
    assert_eq!(translated.translated_title, "수제 가죽 지갑");
    assert_eq!(translated.target_locale, TargetLocale::Ja);

    // the generic path is also a passthrough, including empty input
    assert_eq!(translator.translate_text("", TargetLocale::Ja, PromptKind::Generic).await, "");
}
