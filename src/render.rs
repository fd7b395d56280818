//! HTML article listing built from canonical feeds.

use std::cmp::Ordering;
use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::feed::JsonFeed;

/// Number of articles kept when no limit is configured.
pub const DEFAULT_ARTICLE_LIMIT: usize = 200;

/// One row of the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub home_page_url: Option<String>,
    pub home_page_title: String,
    pub url: String,
    pub title: String,
    /// `date_modified`, falling back to `date_published`.
    pub date: Option<DateTime<Utc>>,
}

/// Flattens the items of `feeds` into articles, most recent first.
///
/// Undated articles sort after every dated one; ties keep feed order. At
/// most `limit` articles are returned.
pub fn collect_articles(feeds: &[JsonFeed], limit: usize) -> Vec<Article> {
    let mut articles: Vec<Article> = feeds
        .iter()
        .flat_map(|feed| {
            feed.items.iter().map(move |item| {
                let url = item.url.clone().unwrap_or_else(|| item.id.clone());
                Article {
                    home_page_url: feed.home_page_url.clone(),
                    home_page_title: feed.title.clone(),
                    title: item.title.clone().unwrap_or_else(|| url.clone()),
                    url,
                    date: item.date_modified.or(item.date_published),
                }
            })
        })
        .collect();

    articles.sort_by(|a, b| newest_first(a.date, b.date));
    articles.truncate(limit);
    articles
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Renders articles as an HTML table. All text and attributes are escaped.
pub fn render_html(articles: &[Article]) -> String {
    let mut html = String::from(concat!(
        "<table>\n",
        "<caption>List of articles</caption>\n",
        "<thead><tr>",
        "<th scope=\"col\">Date</th>",
        "<th scope=\"col\">Arrived from</th>",
        "<th scope=\"col\">Article</th>",
        "</tr></thead>\n",
        "<tbody>\n",
    ));

    for article in articles {
        html.push_str("<tr><td>");
        if let Some(date) = article.date {
            let _ = write!(
                html,
                "<time datetime=\"{}\">{}</time>",
                date.to_rfc3339_opts(SecondsFormat::Millis, true),
                date.format("%Y-%m-%d %H:%M UTC")
            );
        }
        html.push_str("</td><td>");
        anchor(
            &mut html,
            article.home_page_url.as_deref(),
            &article.home_page_title,
        );
        html.push_str("</td><td>");
        anchor(&mut html, Some(&article.url), &article.title);
        html.push_str("</td></tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn anchor(html: &mut String, href: Option<&str>, text: &str) {
    match href {
        Some(href) => {
            let _ = write!(
                html,
                "<a href=\"{}\" referrerpolicy=\"no-referrer\">{}</a>",
                escape(href),
                escape(text)
            );
        }
        None => {
            let _ = write!(html, "<a referrerpolicy=\"no-referrer\">{}</a>", escape(text));
        }
    }
}
