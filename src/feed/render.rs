//! Page renderers for the feed.
//!
//! Both renderers emit `head → body → trailer` into any `fmt::Write` sink.
//! A failed head aborts the render with an error. A failure after the head
//! is logged and stops the render, leaving whatever was already written.

use std::fmt::{self, Write};

use tracing::{debug, warn};

use crate::error::RenderError;
use crate::feed::model::{FeedFilter, FeedItem};

const HEAD: &str = r#"
<!DOCTYPE html>
<html lang="en">
	<head>
	  <title>The most terrible app ever created</title>
    <meta http-equiv="Content-Type" content="text/html; charset=utf-8">
  </head>
  <body>
"#;

const SEARCH_FORM: &str = r#"
<form>
  <label for="search">Search</label>
  <input id="search" type="text" name="header"/>
</form>
"#;

const POST_FORM: &str = r#"
<form method="post">
  <p>
    <label for="header">Header</label>
    <input id="header" name="header" type="text"/>
  </p>
  <p>
    <label for="body">Body</label>
    <textarea id="body" name="body" rows="10" cols="80"></textarea>
  </p>
  <p>
    <label for="tags">Tags</label>
    <input id="tags" name="tags" type="text"/>
  </p>
  <button type="submit">Post!</button>
</form>
"#;

const TRAILER: &str = r#"
  </body>
</html>
"#;

pub const NO_POSTS: &str = "<p>No posts yet</p>";

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Complete,
    /// Output stopped at `stage`; the sink holds a partial page.
    Partial { stage: &'static str },
}

/// The data a page is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct FeedPage<'a> {
    pub filter: &'a FeedFilter,
    pub items: &'a [FeedItem],
}

/// A page renderer selected by the calling operation.
pub trait FeedRenderer {
    /// Emit everything between the head and the trailer.
    fn render_body<W: Write>(&self, out: &mut W, page: &FeedPage<'_>) -> Result<(), RenderError>;

    /// Render a complete page.
    fn render<W: Write>(
        &self,
        out: &mut W,
        page: &FeedPage<'_>,
    ) -> Result<RenderOutcome, RenderError> {
        debug!("Write head");
        emit(out, "head", format_args!("{HEAD}"))?;

        let rest = self.render_body(out, page).and_then(|()| {
            debug!("Write trailer");
            emit(out, "trailer", format_args!("{TRAILER}"))
        });

        match rest {
            Ok(()) => Ok(RenderOutcome::Complete),
            Err(RenderError::Write { stage }) => {
                warn!(stage, "Render aborted, partial page sent");
                Ok(RenderOutcome::Partial { stage })
            }
        }
    }

    /// Render into a fresh `String`.
    fn render_to_string(&self, page: &FeedPage<'_>) -> Result<String, RenderError> {
        let mut out = String::new();
        self.render(&mut out, page)?;
        Ok(out)
    }
}

fn emit<W: Write>(
    out: &mut W,
    stage: &'static str,
    args: fmt::Arguments<'_>,
) -> Result<(), RenderError> {
    out.write_fmt(args).map_err(|_| RenderError::Write { stage })
}

/// Server-side markup: search form, filter banners, one block per item,
/// and the post-creation form.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupRenderer;

impl MarkupRenderer {
    fn render_item<W: Write>(out: &mut W, item: &FeedItem) -> Result<(), RenderError> {
        emit(
            out,
            "item",
            format_args!(
                r#"
<h3 id="{id}">{header}</h3>
<p>{body}</p>
<p>Tags:</p>
<p>{tags}</p>
<form action="/feed/delete">
  <input type="hidden" value="{id}" name="id" />
  <button type="submit">Delete</button>
</form>
"#,
                id = item.id,
                header = item.header,
                body = item.body,
                tags = tag_links(item),
            ),
        )
    }
}

impl FeedRenderer for MarkupRenderer {
    fn render_body<W: Write>(&self, out: &mut W, page: &FeedPage<'_>) -> Result<(), RenderError> {
        emit(out, "search form", format_args!("{SEARCH_FORM}"))?;

        if !page.filter.tag.is_empty() {
            emit(
                out,
                "banner",
                format_args!("<h1>Display posts for tag `{}`</h1>", page.filter.tag),
            )?;
        }
        if !page.filter.header.is_empty() {
            emit(
                out,
                "banner",
                format_args!("<h1>Posts with header `{}`</h1>", page.filter.header),
            )?;
        }

        for item in page.items {
            Self::render_item(out, item)?;
        }
        if page.items.is_empty() {
            emit(out, "empty", format_args!("{NO_POSTS}"))?;
        }

        debug!("Write form");
        emit(out, "post form", format_args!("{POST_FORM}"))
    }
}

/// Link each trimmed tag token back to the tag-filtered list view.
pub fn tag_links(item: &FeedItem) -> String {
    item.tag_tokens()
        .map(|tag| format!("\n<a href=\"/feed?tag={tag}\">{tag}</a>"))
        .collect()
}

/// Client-side rendering: the items ship as a JSON literal inside an inline
/// script that builds one heading+body block per item at load time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClientDataRenderer;

impl ClientDataRenderer {
    /// The JSON literal embedded in the script. Not HTML-escaped.
    pub fn data_literal(items: &[FeedItem]) -> String {
        serde_json::to_string(items).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to encode feed data");
            "[]".to_string()
        })
    }
}

impl FeedRenderer for ClientDataRenderer {
    fn render_body<W: Write>(&self, out: &mut W, page: &FeedPage<'_>) -> Result<(), RenderError> {
        emit(
            out,
            "script",
            format_args!(
                r#"
<script>
const data = {data};
data.forEach(item => {{
  const container = document.createElement('p');
  const header = document.createElement('h1');
  const body = document.createElement('p');
  header.innerText = item.Header;
  body.innerText = item.Body;
  container.appendChild(header);
  container.appendChild(body);
  document.body.appendChild(container);
}});
</script>
"#,
                data = Self::data_literal(page.items),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, header: &str, tags: &str) -> FeedItem {
        FeedItem {
            id,
            header: header.into(),
            body: format!("body of {header}"),
            tags: tags.into(),
        }
    }

    /// A sink that accepts `budget` writes and then fails.
    struct FailingSink {
        buf: String,
        budget: usize,
    }

    impl Write for FailingSink {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.budget == 0 {
                return Err(fmt::Error);
            }
            self.budget -= 1;
            self.buf.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn empty_feed_shows_no_posts() {
        let filter = FeedFilter::default();
        let html = MarkupRenderer
            .render_to_string(&FeedPage {
                filter: &filter,
                items: &[],
            })
            .unwrap();

        assert!(html.contains(NO_POSTS));
        assert!(!html.contains("<h3"));
        assert!(html.contains(r#"<form method="post">"#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn items_render_blocks_and_tag_links() {
        let filter = FeedFilter::default();
        let items = vec![item(3, "Hello", "x, y")];
        let html = MarkupRenderer
            .render_to_string(&FeedPage {
                filter: &filter,
                items: &items,
            })
            .unwrap();

        assert!(html.contains(r#"<h3 id="3">Hello</h3>"#));
        assert!(html.contains(r#"<a href="/feed?tag=x">x</a>"#));
        assert!(html.contains(r#"<a href="/feed?tag=y">y</a>"#));
        assert!(html.contains(r#"<input type="hidden" value="3" name="id" />"#));
        assert!(!html.contains(NO_POSTS));
    }

    #[test]
    fn tag_links_keep_token_order() {
        let links = tag_links(&item(1, "h", " b ,a"));
        assert_eq!(
            links,
            "\n<a href=\"/feed?tag=b\">b</a>\n<a href=\"/feed?tag=a\">a</a>"
        );
    }

    #[test]
    fn banners_reflect_raw_filter_values() {
        let filter = FeedFilter {
            tag: "<b>t</b>".into(),
            header: "h".into(),
        };
        let html = MarkupRenderer
            .render_to_string(&FeedPage {
                filter: &filter,
                items: &[],
            })
            .unwrap();

        assert!(html.contains("<h1>Display posts for tag `<b>t</b>`</h1>"));
        assert!(html.contains("<h1>Posts with header `h`</h1>"));
    }

    #[test]
    fn client_render_embeds_unescaped_json() {
        let filter = FeedFilter::default();
        let items = vec![item(1, "<i>x</i>", "a&b")];
        let html = ClientDataRenderer
            .render_to_string(&FeedPage {
                filter: &filter,
                items: &items,
            })
            .unwrap();

        assert!(html.contains(
            r#"const data = [{"ID":1,"Header":"<i>x</i>","Body":"body of <i>x</i>","Tags":"a&b"}];"#
        ));
        assert!(html.contains("header.innerText = item.Header;"));
    }

    #[test]
    fn client_render_with_no_items_is_empty_array() {
        assert_eq!(ClientDataRenderer::data_literal(&[]), "[]");
    }

    #[test]
    fn head_failure_is_an_error() {
        let filter = FeedFilter::default();
        let mut sink = FailingSink {
            buf: String::new(),
            budget: 0,
        };
        let result = MarkupRenderer.render(
            &mut sink,
            &FeedPage {
                filter: &filter,
                items: &[],
            },
        );
        assert!(matches!(result, Err(RenderError::Write { stage: "head" })));
    }

    #[test]
    fn mid_body_failure_leaves_partial_page() {
        let filter = FeedFilter::default();
        let items = vec![item(1, "a", "t")];
        let mut sink = FailingSink {
            buf: String::new(),
            budget: 2,
        };
        let outcome = MarkupRenderer
            .render(
                &mut sink,
                &FeedPage {
                    filter: &filter,
                    items: &items,
                },
            )
            .unwrap();

        assert!(matches!(outcome, RenderOutcome::Partial { .. }));
        assert!(sink.buf.contains("<!DOCTYPE html>"));
        assert!(!sink.buf.contains("</html>"));
    }
}
