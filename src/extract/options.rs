//! Interactive option harvesting.
//!
//! Option values are absent from the initial DOM; they materialize only
//! after the option trigger is clicked, and multi-group UIs unlock a
//! group only after the previous one has a selection. The revealer is a
//! small state machine over the page: find the trigger, scope the
//! harvest to the revealed panel, parse its lines, advance through
//! groups, and always dismiss the panel afterward so later extraction
//! steps see an unobstructed page.
//!
//! An empty result is legitimate; many products expose no options.

use crate::browser::Page;
use crate::product::OptionGroup;
use indexmap::IndexMap;
use regex::Regex;

/// Settle delay after the option panel is triggered
const PANEL_SETTLE_MS: u64 = 1500;

/// Settle delay after selecting a value to unlock the next group
const ADVANCE_SETTLE_MS: u64 = 800;

/// Settle delay after the purchase sheet is opened
const SHEET_SETTLE_MS: u64 = 2000;

const TRIGGER_LABELS: &[&str] = &["옵션을 선택해주세요", "옵션 선택"];

const TRIGGER_SELECTORS: &[&str] = &[
    r#"[class*="option-select"]"#,
    r#"[class*="optionSelect"]"#,
    r#"[class*="select-option"]"#,
    r#"[class*="option"] button"#,
];

/// Lines that are panel chrome, not option values
const NOISE_LINES: &[&str] = &[
    "선택해주세요",
    "선택하세요",
    "확인",
    "취소",
    "닫기",
    "장바구니",
    "구매하기",
    "필수",
    "총 상품금액",
    "배송비",
    "수량",
    "품절",
    "옵션을",
    "로그인",
];

const PANEL_TEXTS_JS: &str = r#"
    (() => {
        const panels = document.querySelectorAll(
            '[role="dialog"], [role="listbox"], [role="menu"], ' +
            '[class*="bottom-sheet"], [class*="bottomSheet"], ' +
            '[class*="option-panel"], [class*="optionPanel"], ' +
            '[class*="option-list"], [class*="optionList"], ' +
            '[class*="dropdown"], [class*="select-panel"], ' +
            '[class*="modal"], [class*="drawer"]'
        );
        const texts = [];
        for (const panel of panels) {
            const rect = panel.getBoundingClientRect();
            if (rect.width < 50 || rect.height < 50) continue;
            const text = panel.innerText || '';
            if (text.trim()) texts.push(text);
        }
        return JSON.stringify(texts);
    })()
"#;

/// States of the reveal interaction
enum RevealState {
    TriggerSearch,
    PanelOpen,
    ValueHarvest(Vec<String>),
    NextGroupAdvance,
    Done,
}

/// Harvest option groups from the page.
///
/// Tries the option trigger first, then the purchase sheet, then a
/// free-text scan of accumulated page text (lowest confidence).
pub fn reveal(page: &Page) -> Vec<OptionGroup> {
    let groups = harvest_via_trigger(page);
    if !groups.is_empty() {
        return groups;
    }

    let groups = harvest_via_purchase_sheet(page);
    if !groups.is_empty() {
        return groups;
    }

    scan_accumulated_text(page)
}

/// Drive the option trigger and harvest the revealed panel.
fn harvest_via_trigger(page: &Page) -> Vec<OptionGroup> {
    let mut state = RevealState::TriggerSearch;
    let mut groups: Vec<OptionGroup> = Vec::new();
    let mut expected_groups = 0usize;
    let mut advance_rounds = 0usize;

    loop {
        state = match state {
            RevealState::TriggerSearch => {
                let opened = page.click_text(TRIGGER_LABELS) || page.click_selector(TRIGGER_SELECTORS);
                if opened {
                    RevealState::PanelOpen
                } else {
                    log::debug!("no option trigger found");
                    RevealState::Done
                }
            }
            RevealState::PanelOpen => {
                page.settle(PANEL_SETTLE_MS);
                let panel_texts = collect_panel_texts(page);
                if panel_texts.is_empty() {
                    // nothing revealed within the settle window; abort, non-fatal
                    RevealState::Done
                } else {
                    RevealState::ValueHarvest(panel_texts)
                }
            }
            RevealState::ValueHarvest(panel_texts) => {
                merge_groups(&mut groups, parse_panel_texts(&panel_texts));
                expected_groups = expected_groups.max(count_group_headers(&panel_texts));
                let harvested = groups.iter().filter(|g| !g.is_empty()).count();
                if harvested < expected_groups && advance_rounds < expected_groups {
                    RevealState::NextGroupAdvance
                } else {
                    RevealState::Done
                }
            }
            RevealState::NextGroupAdvance => {
                advance_rounds += 1;
                // An under-revealed group is forced open via its header.
                if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
                    page.click_text(&[empty.name.as_str()]);
                    page.settle(ADVANCE_SETTLE_MS);
                }
                // Selecting the first value of the newest complete group
                // unlocks the next one. This mutates page state on
                // purpose: later groups are unreachable otherwise.
                if let Some(last) = groups.iter().rev().find(|g| !g.is_empty()) {
                    page.click_text(&[last.values[0].as_str()]);
                    page.settle(ADVANCE_SETTLE_MS);
                }
                RevealState::PanelOpen
            }
            RevealState::Done => break,
        };
    }

    // Closed: always dismiss, whatever happened above, so the page is
    // usable for the remaining extraction steps.
    page.press_escape();
    page.settle(300);

    groups.retain(|g| !g.is_empty());
    groups
}

/// Backup path: the purchase sheet lists the same groups.
fn harvest_via_purchase_sheet(page: &Page) -> Vec<OptionGroup> {
    if !page.click_text(&["구매하기"]) {
        return Vec::new();
    }
    page.settle(SHEET_SETTLE_MS);

    let texts = collect_panel_texts(page);
    let mut groups = parse_panel_texts(&texts);

    page.press_escape();
    page.settle(500);

    groups.retain(|g| !g.is_empty());
    groups
}

/// Last resort: option mentions in accumulated free text (e.g. the
/// feedback section repeats `그룹명 선택 : 값`). Lower confidence.
fn scan_accumulated_text(page: &Page) -> Vec<OptionGroup> {
    let body = page
        .eval_string("(document.body.innerText || '')")
        .ok()
        .flatten()
        .unwrap_or_default();
    scan_free_text(&body)
}

fn collect_panel_texts(page: &Page) -> Vec<String> {
    page.eval_json::<Vec<String>>(PANEL_TEXTS_JS).ok().flatten().unwrap_or_default()
}

/// Fold a re-harvest into the accumulated groups, keeping first-seen
/// order for both groups and values.
fn merge_groups(existing: &mut Vec<OptionGroup>, harvested: Vec<OptionGroup>) {
    for group in harvested {
        match existing.iter_mut().find(|g| g.name == group.name) {
            Some(current) => {
                for value in group.values {
                    if !current.values.contains(&value) {
                        current.values.push(value);
                    }
                }
            }
            None => existing.push(group),
        }
    }
}

/// Parse panel texts into option groups.
///
/// Group headers are numbered lines (`1. 쿠키 선택 (필수)`) or lines
/// naming a selection; lines below a header become its values after
/// noise and price-suffix filtering.
pub fn parse_panel_texts(texts: &[String]) -> Vec<OptionGroup> {
    let header_re = Regex::new(r"^(\d+)[.)]\s*(.+?)(?:\s*\(필수\))?$").ok();
    let mut collected: IndexMap<String, Vec<String>> = IndexMap::new();

    for text in texts {
        let mut current: Option<String> = None;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = group_header(trimmed, header_re.as_ref()) {
                collected.entry(header.clone()).or_default();
                current = Some(header);
                continue;
            }

            let Some(group) = &current else { continue };
            if let Some(value) = option_value(trimmed) {
                collected.entry(group.clone()).or_default().push(value);
            }
        }
    }

    collected
        .into_iter()
        .map(|(name, values)| OptionGroup::from_raw(name, values))
        .collect()
}

/// Number of distinct numbered group headers across the panel texts
pub fn count_group_headers(texts: &[String]) -> usize {
    let Ok(re) = Regex::new(r"^(\d+)[.)]\s*\S") else {
        return 0;
    };
    let mut max_index = 0usize;
    for text in texts {
        for line in text.lines() {
            if let Some(captures) = re.captures(line.trim()) {
                if let Ok(index) = captures[1].parse::<usize>() {
                    max_index = max_index.max(index);
                }
            }
        }
    }
    max_index
}

fn group_header(line: &str, header_re: Option<&Regex>) -> Option<String> {
    if line.contains('원') || line.contains("구매") || line.contains("해주세요") || line.contains("하세요") {
        return None;
    }

    // numbered form
    if let Some(re) = header_re {
        if let Some(captures) = re.captures(line) {
            let name = captures[2].trim().to_string();
            let len = name.chars().count();
            if (1..=30).contains(&len) {
                return Some(name);
            }
        }
    }

    // unnumbered form, only when it reads like a selection prompt
    if line.contains("선택") {
        let name = line.trim_end_matches("(필수)").trim().to_string();
        let len = name.chars().count();
        if (2..=30).contains(&len) {
            return Some(name);
        }
    }

    None
}

fn option_value(line: &str) -> Option<String> {
    let len = line.chars().count();
    if !(1..=80).contains(&len) {
        return None;
    }
    if NOISE_LINES.iter().any(|noise| line.contains(noise)) {
        return None;
    }
    let price_only = Regex::new(r"^[\d,]+\s*원?$").ok()?;
    if price_only.is_match(line) {
        return None;
    }

    // Strip a trailing price delta, e.g. `초코 (+1,000원)`
    let price_suffix = Regex::new(r"\s*[\(\[]?[+\-]?[\d,]+\s*원[\)\]]?\s*$").ok()?;
    let clean = price_suffix.replace(line, "").trim().to_string();
    (!clean.is_empty()).then_some(clean)
}

/// Synthesize groups from `그룹명 선택 : 값` matches in free text.
pub fn scan_free_text(text: &str) -> Vec<OptionGroup> {
    let Ok(re) = Regex::new(r"([가-힣A-Za-z][가-힣A-Za-z ]*선택)\s*[:：]\s*([^\n*,]+)") else {
        return Vec::new();
    };

    let mut collected: IndexMap<String, Vec<String>> = IndexMap::new();
    for captures in re.captures_iter(text) {
        let name = captures[1].trim().to_string();
        let value = captures[2].split_whitespace().collect::<Vec<_>>().join(" ");
        let name_len = name.chars().count();
        let value_len = value.chars().count();
        if (2..=30).contains(&name_len) && (2..=80).contains(&value_len) {
            collected.entry(name).or_default().push(value);
        }
    }

    collected
        .into_iter()
        .map(|(name, values)| OptionGroup::from_raw(name, values))
        .filter(|group| !group.is_empty())
        .collect()
}
