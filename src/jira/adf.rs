//! Markdown to Atlassian Document Format conversion.
//!
//! The v3 REST API only accepts rich text fields as ADF documents, while agents
//! write plain text or Markdown. Line breaks inside a paragraph are kept as hard
//! breaks so plain text keeps its shape.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde_json::{Value, json};

pub fn to_adf(text: &str) -> Value {
    let mut builder = AdfBuilder::new();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        builder.handle(event);
    }
    builder.finish()
}

struct Frame {
    node: Value,
    implicit: bool,
}

struct AdfBuilder {
    stack: Vec<Frame>,
    marks: Vec<Value>,
}

impl AdfBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                node: json!({ "type": "doc", "version": 1, "content": [] }),
                implicit: false,
            }],
            marks: Vec::new(),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.text(&text, None)
            }
            Event::Code(code) => self.text(&code, Some(json!({ "type": "code" }))),
            Event::SoftBreak | Event::HardBreak => {
                if self.top_type() == Some("codeBlock") {
                    self.text("\n", None);
                } else {
                    self.ensure_inline_container();
                    self.append(json!({ "type": "hardBreak" }));
                }
            }
            Event::Rule => {
                self.close_implicit();
                self.append(json!({ "type": "rule" }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_block(json!({ "type": "paragraph", "content": [] })),
            Tag::Heading { level, .. } => self.open_block(json!({
                "type": "heading",
                "attrs": { "level": level as usize },
                "content": []
            })),
            Tag::BlockQuote { .. } => {
                self.open_block(json!({ "type": "blockquote", "content": [] }))
            }
            Tag::CodeBlock(kind) => {
                let mut node = json!({ "type": "codeBlock", "content": [] });
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        node["attrs"] = json!({ "language": lang.to_string() });
                    }
                }
                self.open_block(node);
            }
            Tag::List(Some(order)) => self.open_block(json!({
                "type": "orderedList",
                "attrs": { "order": order },
                "content": []
            })),
            Tag::List(None) => self.open_block(json!({ "type": "bulletList", "content": [] })),
            Tag::Item => self.open_block(json!({ "type": "listItem", "content": [] })),
            Tag::Emphasis => self.marks.push(json!({ "type": "em" })),
            Tag::Strong => self.marks.push(json!({ "type": "strong" })),
            Tag::Strikethrough => self.marks.push(json!({ "type": "strike" })),
            Tag::Link { dest_url, .. } => self.marks.push(json!({
                "type": "link",
                "attrs": { "href": dest_url.to_string() }
            })),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote { .. }
            | TagEnd::List(_)
            | TagEnd::Item => {
                self.close_implicit();
                self.close_block();
            }
            TagEnd::CodeBlock => {
                if let Some(last) = self
                    .stack
                    .last_mut()
                    .and_then(|f| f.node["content"].as_array_mut())
                    .and_then(|c| c.last_mut())
                {
                    if let Some(text) = last["text"].as_str() {
                        let trimmed = text.trim_end_matches('\n').to_string();
                        last["text"] = json!(trimmed);
                    }
                }
                self.close_block();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.marks.pop();
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str, extra_mark: Option<Value>) {
        if text.is_empty() {
            return;
        }
        self.ensure_inline_container();

        let mut node = json!({ "type": "text", "text": text });
        let mut marks = self.marks.clone();
        if self.top_type() != Some("codeBlock") {
            // The code mark may only be combined with link.
            if extra_mark.as_ref().is_some_and(|m| m["type"] == "code") {
                marks.retain(|m| m["type"] == "link");
            }
            marks.extend(extra_mark);
            if !marks.is_empty() {
                node["marks"] = Value::Array(marks);
            }
        }
        self.append(node);
    }

    fn top_type(&self) -> Option<&str> {
        self.stack.last().and_then(|f| f.node["type"].as_str())
    }

    fn ensure_inline_container(&mut self) {
        if !matches!(self.top_type(), Some("paragraph" | "heading" | "codeBlock")) {
            self.stack.push(Frame {
                node: json!({ "type": "paragraph", "content": [] }),
                implicit: true,
            });
        }
    }

    fn open_block(&mut self, node: Value) {
        self.close_implicit();
        self.stack.push(Frame {
            node,
            implicit: false,
        });
    }

    fn close_implicit(&mut self) {
        while self.stack.last().is_some_and(|f| f.implicit) {
            self.close_block();
        }
    }

    fn close_block(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(frame) = self.stack.pop() {
            let empty_paragraph = frame.node["type"] == "paragraph"
                && frame.node["content"].as_array().is_some_and(|c| c.is_empty());
            if !empty_paragraph {
                self.append(frame.node);
            }
        }
    }

    fn append(&mut self, node: Value) {
        if let Some(content) = self
            .stack
            .last_mut()
            .and_then(|f| f.node["content"].as_array_mut())
        {
            content.push(node);
        }
    }

    fn finish(mut self) -> Value {
        while self.stack.len() > 1 {
            self.close_block();
        }
        self.stack
            .pop()
            .map(|f| f.node)
            .unwrap_or_else(|| json!({ "type": "doc", "version": 1, "content": [] }))
    }
}
