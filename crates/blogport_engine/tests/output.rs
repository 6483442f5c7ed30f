use blogport_engine::{
    asset_filename, build_post_document, post_filename, render_site_config, slugify,
    split_front_matter, BlogInfo,
};
use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

#[test]
fn slugs_collapse_punctuation_runs() {
    assert_eq!(slugify("Hello, World!"), "hello-world");
    assert_eq!(slugify("  --Rust 2021 -- edition--  "), "rust-2021-edition");
    assert_eq!(slugify("Caf\u{e9} cr\u{e8}me"), "caf-cr-me");
    assert_eq!(slugify("!!!"), "");
}

#[test]
fn asset_names_combine_seed_sequence_and_extension() {
    assert_eq!(
        asset_filename("Hello, World! 2020", 3, "https://img.test/a/b/photo.JPG?w=400"),
        "hello-world-2020-3.JPG"
    );
    assert_eq!(
        asset_filename("Trip", 1, "https://img.test/s1600/no-extension"),
        "trip-1.jpg"
    );
    assert_eq!(asset_filename("???", 2, "/relative/pic.gif#x"), "untitled-2.gif");
}

#[test]
fn asset_name_ignores_implausible_extensions() {
    assert_eq!(
        asset_filename("Post", 4, "https://img.test/archive.tar.longext"),
        "post-4.jpg"
    );
}

#[test]
fn post_names_follow_jekyll_convention() {
    let date = NaiveDate::from_ymd_opt(2020, 5, 17).unwrap();
    assert_eq!(post_filename(date, "My First Post!"), "2020-05-17-my-first-post.md");
    assert_eq!(post_filename(date, "..."), "2020-05-17-untitled.md");
}

#[test]
fn post_document_has_front_matter_and_body() {
    let published = Utc.with_ymd_and_hms(2020, 5, 17, 17, 30, 0).unwrap();
    let tags = vec!["rust".to_string(), "travel".to_string()];

    let doc = build_post_document("Ideas: \"big\" ones", &published, &tags, "Body text");

    assert_eq!(
        doc,
        "---\n\
         title: \"Ideas&#58; \\\"big\\\" ones\"\n\
         date: 2020-05-17 17:30:00 +0000\n\
         tags:\n  - \"rust\"\n  - \"travel\"\n\
         ---\n\nBody text"
    );
}

#[test]
fn untagged_post_is_uncategorized() {
    let published = Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();
    let doc = build_post_document("Plain", &published, &[], "x");
    assert!(doc.contains("tags:\n  - \"uncategorized\"\n---"));
}

#[test]
fn tags_with_yaml_syntax_stay_plain_strings() {
    let published = Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();
    let tags = vec![
        "C#: tips".to_string(),
        "- draft".to_string(),
        r#"say "hi""#.to_string(),
    ];

    let doc = build_post_document("Plain", &published, &tags, "x");

    assert!(doc.contains(
        "tags:\n  - \"C#: tips\"\n  - \"- draft\"\n  - \"say \\\"hi\\\"\"\n---"
    ));
}

#[test]
fn built_document_splits_back_into_parts() {
    let published = Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();
    let doc = build_post_document("Plain", &published, &[], "Body");

    let (front, body) = split_front_matter(&doc);
    assert!(front.starts_with("---\ntitle: \"Plain\""));
    assert!(front.ends_with("\n---"));
    assert_eq!(body, "\n\nBody");
}

#[test]
fn site_config_carries_blog_identity() {
    let info = BlogInfo {
        title: "Notes \"&\" Sketches".to_string(),
        author_name: "Ada Writer".to_string(),
        author_email: "ada@example.com".to_string(),
    };

    let config = render_site_config(&info);

    assert!(config.contains("title                    : \"Notes \\\"&\\\" Sketches\"\n"));
    assert!(config.contains("  name             : \"Ada Writer\"\n"));
    assert!(config.contains("url: \"mailto:ada@example.com\""));
    assert!(config.contains("permalink: /:categories/:year/:month/:day/:title/"));
}
