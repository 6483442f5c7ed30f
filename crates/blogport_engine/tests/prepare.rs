use blogport_engine::{
    annotate_code_languages, detect_language, normalize, prepare_markup, KeepRemote, Language,
};
use pretty_assertions::assert_eq;

#[test]
fn languages_are_detected_from_keywords() {
    let cases = [
        ("function add(a, b) { return a + b; }", Some(Language::JavaScript)),
        ("items.map(x => x * 2)", Some(Language::JavaScript)),
        ("def main():\n    print('hi')", Some(Language::Python)),
        ("public static int answer() { return 42; }", Some(Language::Java)),
        ("&lt;div&gt;hello&lt;/div&gt;", Some(Language::Html)),
        ("#include <stdio.h>\nint main() { printf(\"hi\"); }", Some(Language::C)),
        ("std::cout << x;", Some(Language::Cpp)),
        ("<?php echo $x; ?>", Some(Language::Php)),
        ("SELECT name FROM users WHERE id = 1", Some(Language::Sql)),
        ("just some prose", None),
    ];
    for (code, expected) in cases {
        assert_eq!(detect_language(code), expected, "code: {code}");
    }
}

#[test]
fn keywords_must_stand_alone() {
    assert_eq!(detect_language("el.classList.add(name)"), None);
    assert_eq!(detect_language("if (x === undefined) return"), None);
    assert_eq!(detect_language("from itertools import chain"), Some(Language::Python));
}

#[test]
fn earlier_rules_win_over_later_ones() {
    // Matches both the JavaScript and PHP rules.
    assert_eq!(
        detect_language("function greet() { return $name; }"),
        Some(Language::JavaScript)
    );
}

#[test]
fn unlabeled_blocks_get_a_language_class() {
    assert_eq!(
        annotate_code_languages("<pre>function f() {}</pre>"),
        r#"<pre class="language-javascript">function f() {}</pre>"#
    );
    assert_eq!(
        annotate_code_languages("<pre><code>def f(): pass</code></pre>"),
        r#"<pre><code class="language-python">def f(): pass</code></pre>"#
    );
}

#[test]
fn labeled_and_unrecognized_blocks_are_untouched() {
    let labeled = r#"<pre class="language-sql"><code>function x</code></pre>"#;
    assert_eq!(annotate_code_languages(labeled), labeled);

    let inner_labeled = r#"<pre><code class="lang-go">var x = 1</code></pre>"#;
    assert_eq!(annotate_code_languages(inner_labeled), inner_labeled);

    let prose = "<pre>lorem ipsum</pre>";
    assert_eq!(annotate_code_languages(prose), prose);
}

#[test]
fn presentation_markup_is_removed() {
    let html = r#"<div style="color:red"><span>Hi</span><br><font face="x">there</font></div>"#;
    assert_eq!(prepare_markup(html), "Hi<br />there");
}

#[test]
fn only_style_attributes_are_dropped() {
    let html = r#"<p style='margin:0' class="x" data-style="keep">t</p>"#;
    assert_eq!(prepare_markup(html), r#"<p class="x" data-style="keep">t</p>"#);
}

#[test]
fn detected_language_reaches_the_fence() {
    let prepared = prepare_markup("<pre><code>const x = 1;</code></pre>");
    let markdown = normalize(&prepared, &mut KeepRemote).unwrap();
    assert_eq!(markdown, "```javascript\nconst x = 1;\n```");
}
