//! Prompt templates per target locale and field kind.
//!
//! Long-form descriptions get a marketplace-aware template with the
//! terminology and exclusion rules the listings need; titles and
//! option labels get short no-explanation templates; OCR output goes
//! through a generic template.

use crate::product::TargetLocale;

/// Which template family to use for a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Title,
    Description,
    OptionLabel,
    Generic,
}

/// Instruction for the vision model; answers with the fixed sentinel
/// when the image carries no text.
pub const OCR_INSTRUCTION: &str =
    "이 이미지에서 한국어 텍스트만 추출해주세요. 텍스트가 없으면 NO_TEXT만 응답하세요.";

/// Sentinel the vision model returns for text-free images
pub const NO_TEXT_SENTINEL: &str = "NO_TEXT";

const ENGLISH_DESCRIPTION: &str = r#"You are an online seller creating a product description for idus (아이디어스), the largest handmade online marketplace in Asia. Sellers are called "artists" on this platform.

Translate the Korean product description into English.

Guidelines:
- Include all product descriptions, features, material and craftsmanship details, care instructions, and cultural context. Keep emojis from the original text.
- Exclude Korea-specific content: Korean holidays and events, prices in Korean Won (replace specific amounts with "additional charges"), shipping details, exchange and refund policies, discount promotions. Replace percentage discounts with "Special Discount".
- Do NOT invent information that doesn't exist in the source text.
- Sellers are "artists" (작가); products are "handmade creations" or "items", never "products" or "goods".
- Romanize Korean artist and brand names phonetically; keep English names as-is.

Korean Text to Translate:
{text}

English Translation:"#;

const ENGLISH_TITLE: &str = r#"Translate this Korean product title to English.
Keep it concise, SEO-friendly, and appealing for international buyers.
Preserve brand names with romanization.
Do not add any explanation, just output the translated title.

Korean: {text}

English:"#;

const ENGLISH_OPTION: &str = r#"Translate this Korean product option to English.
Keep the translation short and clear. Romanize Korean proper nouns.
Do not add any explanation, just output the translation.

Korean: {text}

English:"#;

const JAPANESE_DESCRIPTION: &str = r#"You are an online seller creating a product description to list your product on idus (아이디어스 in Korean, アイディアス in Japanese), the largest handmade online marketplace in Asia.

Translate the content from Korean to Japanese.

Guidelines:
- Use a friendly and warm tone while maintaining the mood of the original content. Keep emojis from the original text.
- Exclude Korea-specific content: Korean holidays and seasonal events, prices in Korean Won (replace specific amounts with "追加料金"), shipping details, exchange and refund policies, discount promotions. Replace percentage discounts with "特別割引".
- Include the production lead time but not the shipping period.
- Do NOT create new content beyond the given source text.
- Sellers are "artists" (작가 → 作家); products are "ハンドメイド作品" or "作品", never 商品.
- Transliterate Korean artist and brand names into カタカナ; keep English names in English.
- Use natural expressions benchmarked against Minne (ミンネ) and Creema (クリーマ).

Korean Text to Translate:
{text}

Japanese Translation:"#;

const JAPANESE_TITLE: &str = r#"Translate this Korean product title to Japanese.
Keep it concise and appealing for Japanese handmade marketplaces (like Minne, Creema).
Preserve brand names with Japanese phonetics (カタカナ).
Do not add any explanation, just output the translated title.

Korean: {text}

Japanese:"#;

const JAPANESE_OPTION: &str = r#"Translate this Korean product option to Japanese.
Keep the translation short and clear. Use カタカナ for Korean proper nouns.
Do not add any explanation, just output the translation.

Korean: {text}

Japanese:"#;

/// Render the prompt for a piece of text
pub fn render(kind: PromptKind, locale: TargetLocale, text: &str) -> String {
    let template = match (locale, kind) {
        (TargetLocale::En, PromptKind::Description) => ENGLISH_DESCRIPTION,
        (TargetLocale::En, PromptKind::Title) => ENGLISH_TITLE,
        (TargetLocale::En, PromptKind::OptionLabel) => ENGLISH_OPTION,
        (TargetLocale::Ja, PromptKind::Description) => JAPANESE_DESCRIPTION,
        (TargetLocale::Ja, PromptKind::Title) => JAPANESE_TITLE,
        (TargetLocale::Ja, PromptKind::OptionLabel) => JAPANESE_OPTION,
        (locale, PromptKind::Generic) => {
            return format!(
                "Translate this Korean text to {lang}. Output only the translation, nothing else.\n\nKorean: {text}\n\n{lang}:",
                lang = locale.language_name(),
                text = text
            );
        }
    };
    template.replace("{text}", text)
}

/// Strip labels the model sometimes prepends to its output
pub fn strip_prefixes(text: &str, locale: TargetLocale) -> String {
    let mut result = text.trim();
    let prefixes = [
        format!("{}:", locale.language_name()),
        "Translation:".to_string(),
        "번역:".to_string(),
    ];
    for prefix in &prefixes {
        if let Some(stripped) = result.strip_prefix(prefix.as_str()) {
            result = stripped.trim();
        }
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_text() {
        let prompt = render(PromptKind::Title, TargetLocale::En, "수제 가죽 지갑");
        assert!(prompt.contains("수제 가죽 지갑"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_render_selects_locale_template() {
        let en = render(PromptKind::Description, TargetLocale::En, "설명");
        let ja = render(PromptKind::Description, TargetLocale::Ja, "설명");
        assert!(en.contains("English Translation:"));
        assert!(ja.contains("Japanese Translation:"));
    }

    #[test]
    fn test_render_generic() {
        let prompt = render(PromptKind::Generic, TargetLocale::Ja, "이미지 속 문구");
        assert!(prompt.contains("Japanese"));
        assert!(prompt.contains("이미지 속 문구"));
    }

    #[test]
    fn test_strip_prefixes() {
        assert_eq!(
            strip_prefixes("English: Handmade wallet", TargetLocale::En),
            "Handmade wallet"
        );
        assert_eq!(
            strip_prefixes("Translation: 財布", TargetLocale::Ja),
            "財布"
        );
        assert_eq!(strip_prefixes("no prefix here", TargetLocale::En), "no prefix here");
    }
}
