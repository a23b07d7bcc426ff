use markdown::mdast::{Node, Paragraph, Text};
use mdxtext_core::{MdxTextError, Syntax};
use mdxtext_extract::{
    ExtractOptions, Format, HandlerContext, Placement, UnknownComponentHandling, extract,
};

fn text_of(source: &str) -> String {
    extract(source, &ExtractOptions::default())
        .expect("extract should succeed")
        .content
}

fn markdown_of(source: &str) -> String {
    extract(source, &ExtractOptions::markdown())
        .expect("extract should succeed")
        .content
}

fn md_text_of(source: &str) -> String {
    let options = ExtractOptions::default().with_syntax(Syntax::Md);
    extract(source, &options).expect("extract should succeed").content
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[test]
fn note_content_is_kept_without_the_tag() {
    let content = text_of("<Note>Inside</Note>");
    assert!(content.contains("Inside"));
    assert!(!content.contains("<Note>"));

    let content = text_of("<Note>\n  Block **inside**\n</Note>");
    assert_eq!(content, "Block inside");
}

#[test]
fn image_only_paragraphs_disappear() {
    assert_eq!(text_of("Before\n\n<img src=\"a.png\" />\n\nAfter"), "Before\n\nAfter");
    assert_eq!(text_of("Before\n\n![alt](a.png)\n\nAfter"), "Before\n\nAfter");
}

#[test]
fn esm_and_expressions_are_removed() {
    let source = "import X from './x.js'\nexport const meta = {}\n\n# Title {#custom}\n\nValue: {1 + 1} done";
    assert_eq!(text_of(source), "Title\n\nValue: done");
}

#[test]
fn unknown_components_follow_the_policy() {
    let source = "<Tabs>\n  Tab content\n</Tabs>\n\n<section>\n  Wrapped\n</section>";
    assert_eq!(text_of(source), "Tab content\n\nWrapped");

    let options =
        ExtractOptions::default().with_unknown_component_handling(UnknownComponentHandling::Drop);
    assert_eq!(extract(source, &options).unwrap().content, "Wrapped");
}

#[test]
fn custom_handlers_receive_context() {
    let options = ExtractOptions::default().with_handler("Tab", |ctx: &HandlerContext<'_>| {
        assert_eq!(ctx.placement, Placement::Block);
        assert_eq!(ctx.format, Format::Text);
        let label = ctx.element.attribute("label").unwrap_or("Tab");
        let mut nodes = vec![Node::Paragraph(Paragraph {
            children: vec![Node::Text(Text {
                value: format!("{label}:"),
                position: None,
            })],
            position: None,
        })];
        nodes.extend(ctx.transform_children_blocks());
        nodes
    });
    let result = extract("<Tab label=\"npm\">\n  npm install\n</Tab>", &options).unwrap();
    assert_eq!(result.content, "npm:\n\nnpm install");
}

#[test]
fn handlers_can_report_diagnostics() {
    let options = ExtractOptions::default().with_handler("Deprecated", |ctx: &HandlerContext<'_>| {
        ctx.warn("Deprecated component");
        ctx.transform_children_blocks()
    });
    let result = extract("Intro\n\n<Deprecated>\n  Old\n</Deprecated>", &options).unwrap();
    assert_eq!(result.content, "Intro\n\nOld");
    let diagnostics: Vec<_> = result.diagnostics.iter().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Deprecated component");
    assert_eq!(diagnostics[0].location.as_ref().map(|l| l.line), Some(3));
}

#[test]
fn code_meta_is_sorted() {
    let content = markdown_of("```js showLineNumbers foo=\"bar\"\nlet a = 1;\n```");
    assert_eq!(content, "```js foo=\"bar\" showLineNumbers\nlet a = 1;\n```");
    assert_eq!(text_of("```js showLineNumbers\nlet a = 1;\n```"), "let a = 1;");
}

#[test]
fn frontmatter_is_split_off() {
    let source = "---\ntitle: Hello\ntags:\n  - a\n---\n\n# Body";
    let result = extract(source, &ExtractOptions::default()).unwrap();
    assert_eq!(result.content, "Body");
    let frontmatter = result.frontmatter.expect("frontmatter");
    assert_eq!(frontmatter["title"], "Hello");
    assert_eq!(frontmatter["tags"][0], "a");
}

#[test]
fn invalid_frontmatter_is_an_error() {
    let err = extract("---\ntitle: [unclosed\n---\nBody", &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, MdxTextError::Frontmatter(_)));
}

#[test]
fn links_in_text_and_markdown() {
    let source = "See [the docs](https://docs.dev) and [https://a.dev](https://a.dev).";
    assert_eq!(
        text_of(source),
        "See the docs (https://docs.dev) and https://a.dev."
    );
    assert_eq!(markdown_of(source), source);
}

#[test]
fn footnotes_are_unwrapped() {
    assert_eq!(text_of("Claim[^1].\n\n[^1]: Source here."), "Claim.\n\nSource here.");
}

#[test]
fn raw_html_tables_and_details() {
    let source = "<table>\n  <tr><th>Name</th><th>Role</th></tr>\n  <tr><td></td><td></td></tr>\n  <tr><td>Ada</td><td>Engineer</td></tr>\n</table>\n\n<details>\n<summary>More</summary>\nHidden &amp; body\n</details>";
    assert_eq!(
        md_text_of(source),
        "Name | Role\n\nAda | Engineer\n\nMore\n\nHidden & body"
    );
}

#[test]
fn raw_html_is_flattened() {
    let source = "<div>\n<p>First</p>\n<!-- note -->\n<p>Second<br>line</p>\n</div>\n\nText with <kbd>Ctrl</kbd> key.";
    assert_eq!(md_text_of(source), "First\n\nSecond\n\nline\n\nText with Ctrl key.");
}

#[test]
fn inline_html_tags_are_stripped() {
    assert_eq!(md_text_of("a <span>b</span> c"), "a b c");
    assert_eq!(
        md_text_of("Read <a href=\"https://x.dev\">the guide</a> first."),
        "Read the guide first."
    );
    assert_eq!(md_text_of("x <img src=a.png> y"), "x y");
}

#[test]
fn url_link_text_round_trips() {
    let source = "[https://a.dev](https://a.dev)";
    assert_eq!(markdown_of(source), source);
    assert_eq!(text_of(&markdown_of(source)), text_of(source));
}

#[test]
fn gfm_tables_become_rows() {
    let source = "| Key | Value |\n| --- | ----- |\n| a   | `1`   |\n|     |       |";
    assert_eq!(text_of(source), "Key | Value\n\na | 1");
}

#[test]
fn nested_lists_in_text() {
    let source = "- one\n  - nested\n    - deeper\n- two";
    assert_eq!(text_of(source), "one\n  nested\n    deeper\ntwo");
    assert_eq!(markdown_of(source), source);
}

#[test]
fn markdown_output_keeps_the_words() {
    let source = "# Title\n\nSome *emphasis*, ~~gone~~ and `code` with [a link](https://x.dev).\n\n1. one\n2. two\n\n> quote\n\n| a | b |\n| - | - |\n| 1 | 2 |\n\n<Card>\n  Card text\n</Card>";
    let direct = text_of(source);
    let markdown = markdown_of(source);
    let again = text_of(&markdown);
    assert_eq!(words(&again), words(&direct));
}

#[test]
fn markdown_output_is_stable() {
    let source = "# Title\n\nA *b* **c** `d` [e](https://f.dev \"g\")\n\n- [ ] task\n\n> quote";
    let once = markdown_of(source);
    assert_eq!(markdown_of(&once), once);
}

#[test]
fn docs_page_as_markdown() {
    let source = r#"---
title: Install
---
import { Tabs } from '@x/components';

# Install

Run the command below.{/* comment */}

<Note>
  Requires **Node 18**.
</Note>

```sh title="Terminal" frame
npm i mdxtext
```

<Tabs>
  <Tab label="pnpm">pnpm add mdxtext</Tab>
</Tabs>

<video src="demo.mp4" />
"#;
    insta::assert_snapshot!(markdown_of(source), @r#"
    # Install

    Run the command below.

    Requires **Node 18**.

    ```sh frame title="Terminal"
    npm i mdxtext
    ```

    pnpm add mdxtext
    "#);
}
