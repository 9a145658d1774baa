//! Live-browser integration tests.
//!
//! These require Chrome/Chromium installed and network access, so they
//! are ignored by default. Run with: cargo test -- --ignored

use idus_translator::extract::{dom, options};
use idus_translator::{BrowserSession, LaunchOptions};

fn data_url(html: &str) -> String {
    format!("data:text/html,{}", html.replace('#', "%23"))
}

#[test]
#[ignore]
fn dom_title_strategy_reads_heading() {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let page = session.open_page().expect("Failed to open page");

    page.goto(&data_url("<html><body><h1>수제 도자기 컵</h1></body></html>")).expect("Navigation failed");

    let title = dom::extract_title(&page);
    assert_eq!(title.as_deref(), Some("수제 도자기 컵"));

    page.close();
    session.close();
}

#[test]
#[ignore]
fn option_reveal_harvests_a_mock_two_group_panel() {
    let html = r##"
        <html><body>
        <button onclick="document.getElementById('panel').style.display='block'">옵션을 선택해주세요</button>
        <div id="panel" role="dialog" style="display:none;width:300px;height:300px">
            1. Flavor<br>AA<br>BB<br>2. Size<br>SS<br>MM
        </div>
        </body></html>
    "##;

    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let page = session.open_page().expect("Failed to open page");
    page.goto(&data_url(html)).expect("Navigation failed");

    let groups = options::reveal(&page);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "Flavor");
    assert_eq!(groups[0].values, vec!["AA", "BB"]);
    assert_eq!(groups[1].name, "Size");
    assert_eq!(groups[1].values, vec!["SS", "MM"]);

    page.close();
    session.close();
}

#[test]
#[ignore]
fn full_extraction_against_a_real_product_page() {
    let url = std::env::var("IDUS_TEST_URL")
        .unwrap_or_else(|_| "https://www.idus.com/v2/product/87beb859-49b2-4c18-86b4-f300b31d6247".to_string());

    let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
    let page = session.open_page().expect("Failed to open page");

    let record = idus_translator::extract::extract_product(&page, &url).expect("extraction failed");

    // sentinel guarantee: scalar fields are never empty
    assert!(!record.title.is_empty());
    assert!(!record.artist_name.is_empty());
    assert!(!record.price.is_empty());
    assert!(!record.description.is_empty());

    page.close();
    session.close();
}
