use roxmltree::{Document, Node, ParsingOptions};

use crate::FeedEntry;

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("feed payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("xml feed parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("document is neither an RSS channel nor an Atom feed")]
    NotAFeed,
}

pub fn parse_feed(raw: &[u8]) -> Result<Vec<FeedEntry>, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(
        text.trim_start_matches('\u{feff}').trim_start(),
        options,
    )?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "rss" => {
            let channel = child(root, "channel").ok_or(ParseError::NotAFeed)?;
            Ok(channel
                .children()
                .filter(|node| is_sibling_element(channel, *node, "item"))
                .map(entry_from_item)
                .collect())
        }
        "feed" if root.tag_name().namespace() == Some(ATOM_NS) => Ok(root
            .children()
            .filter(|node| is_sibling_element(root, *node, "entry"))
            .map(entry_from_atom)
            .collect()),
        _ => Err(ParseError::NotAFeed),
    }
}

fn entry_from_item(item: Node) -> FeedEntry {
    let content = item
        .children()
        .find(|node| {
            node.tag_name().namespace() == Some(CONTENT_NS) && node.tag_name().name() == "encoded"
        })
        .or_else(|| child(item, "description"))
        .map(text_of);

    FeedEntry {
        title: child(item, "title").map(text_of).unwrap_or_default().trim().to_string(),
        published: child(item, "pubDate").map(text_of).map(|date| date.trim().to_string()),
        content,
        link: child(item, "link").map(text_of).unwrap_or_default().trim().to_string(),
        start_date: vendor_field(item, "startDate"),
        end_date: vendor_field(item, "endDate"),
        location: vendor_field(item, "location"),
    }
}

fn entry_from_atom(entry: Node) -> FeedEntry {
    let link = entry
        .children()
        .filter(|node| is_sibling_element(entry, *node, "link"))
        .find(|node| matches!(node.attribute("rel"), None | Some("alternate")))
        .and_then(|node| node.attribute("href"))
        .unwrap_or_default()
        .to_string();

    let content = child(entry, "content")
        .or_else(|| child(entry, "summary"))
        .map(text_of);

    FeedEntry {
        title: child(entry, "title").map(text_of).unwrap_or_default().trim().to_string(),
        published: child(entry, "published")
            .or_else(|| child(entry, "updated"))
            .map(text_of)
            .map(|date| date.trim().to_string()),
        content,
        link,
        start_date: vendor_field(entry, "startDate"),
        end_date: vendor_field(entry, "endDate"),
        location: vendor_field(entry, "location"),
    }
}

/// `node` is a `name` element in the same namespace as `parent` (none for RSS, Atom's for Atom).
fn is_sibling_element(parent: Node, node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == parent.tag_name().namespace()
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_sibling_element(node, *child, name))
}

/// Events-calendar plugin fields live in their own namespace (`mec:startDate` etc.).
fn vendor_field(node: Node, name: &str) -> Option<String> {
    node.children()
        .filter(|child| child.is_element())
        .filter(|child| {
            !matches!(
                child.tag_name().namespace(),
                None | Some(ATOM_NS) | Some(CONTENT_NS)
            )
        })
        .find(|child| child.tag_name().name().eq_ignore_ascii_case(name))
        .map(text_of)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn text_of(node: Node) -> String {
    node.descendants()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .collect()
}
