//! Markup-level extraction. Every function here takes page HTML and returns raw
//! strings; normalisation happens in the components that call them.

use crate::config::{BreakdownConfig, ClassicColumns, DiscoveryConfig};
use crate::models::GroupType;
use crate::scraper::cleaner::{contains_any, contains_ignore_case, eq_ignore_case};
use crate::scraper::error::ScrapeError;
use scraper::{ElementRef, Html, Selector};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn selector(key: &str, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::configuration(key, format!("invalid selector `{css}`: {e}")))
}

/// `("a", "btn primary")` → `a.btn.primary`
fn class_selector(tag: &str, classes: &str) -> String {
    let classes: String = classes.split_whitespace().map(|c| format!(".{c}")).collect();
    format!("{}{}", tag.trim(), classes)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Text nodes trimmed one by one and glued without separator.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

// ── Index page ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLink {
    pub text: String,
    pub href: String,
}

/// Links that follow the "All Contests" heading in document order.
///
/// `Ok(None)` when the heading is not on the page.
pub fn parse_group_links(
    html: &str,
    cfg: &DiscoveryConfig,
    url: &str,
) -> Result<Option<Vec<GroupLink>>, ScrapeError> {
    let heading_sel = selector("discovery.heading_selector", &cfg.heading_selector)?;
    let link_sel = selector(
        "discovery.link_class",
        &class_selector(&cfg.link_tag, &cfg.link_class),
    )?;

    let doc = Html::parse_document(html);

    let Some(heading) = doc
        .select(&heading_sel)
        .find(|h| eq_ignore_case(&text_of(*h), &cfg.heading_text))
    else {
        return Ok(None);
    };
    let heading_id = heading.id();

    let mut links = Vec::new();
    let mut past_heading = false;

    for node in doc.root_element().descendants() {
        if node.id() == heading_id {
            past_heading = true;
            continue;
        }
        if !past_heading {
            continue;
        }
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if !link_sel.matches(&el) {
            continue;
        }

        let text = text_of(el);
        let href = el.value().attr("href").ok_or_else(|| {
            ScrapeError::markup(url, format!("href of group link `{}`", text.trim()))
        })?;
        links.push(GroupLink {
            text,
            href: href.to_string(),
        });
    }

    Ok(Some(links))
}

// ── Group page ────────────────────────────────────────────────────────────────

/// A classics game hiding in the first container of a tour page.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedClassics {
    pub heading: String,
    pub href: String,
}

/// Raw facts of one tour container.
#[derive(Debug, Clone, PartialEq)]
pub struct TourItem {
    pub start_date: String,
    pub heading: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupPage {
    pub group_type: GroupType,
    pub embedded_classics: Option<EmbeddedClassics>,
    /// Empty for classics pages.
    pub tour_items: Vec<TourItem>,
}

pub fn parse_group_page(
    html: &str,
    cfg: &BreakdownConfig,
    url: &str,
) -> Result<GroupPage, ScrapeError> {
    let container_sel = selector(
        "breakdown.container_class",
        &class_selector("div", &cfg.container_class),
    )?;
    let marker_sel = selector(
        "breakdown.tour_marker_class",
        &class_selector("span", &cfg.tour_marker_class),
    )?;
    let link_sel = selector(
        "breakdown.link_class",
        &class_selector("a", &cfg.link_class),
    )?;
    let h2_sel = selector("h2", "h2")?;
    let span_sel = selector("span", "span")?;

    let doc = Html::parse_document(html);
    let containers: Vec<ElementRef<'_>> = doc.select(&container_sel).collect();

    let Some(first) = containers.first() else {
        return Err(ScrapeError::markup(
            url,
            format!("competition container div.{}", cfg.container_class),
        ));
    };

    // Structural: the marker element alone decides.
    let group_type = if first.select(&marker_sel).next().is_some() {
        GroupType::Tour
    } else {
        GroupType::Classics
    };

    let embedded_classics = match first.select(&h2_sel).next() {
        Some(h2) if contains_ignore_case(&text_of(h2), &cfg.womens_classics_marker) => {
            let href = first
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .ok_or_else(|| ScrapeError::markup(url, "link of the embedded classics game"))?;
            Some(EmbeddedClassics {
                heading: text_of(h2).trim().to_string(),
                href: href.to_string(),
            })
        }
        _ => None,
    };

    let mut tour_items = Vec::new();
    if group_type == GroupType::Tour {
        let skip = usize::from(embedded_classics.is_some());
        for (i, container) in containers.iter().enumerate().skip(skip) {
            let span = container
                .select(&span_sel)
                .nth(cfg.start_date_span - 1)
                .ok_or_else(|| {
                    ScrapeError::markup(
                        url,
                        format!("start date span #{} in container #{}", cfg.start_date_span, i + 1),
                    )
                })?;
            let start_date = text_of(span)
                .trim()
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();

            let heading = container
                .select(&h2_sel)
                .next()
                .map(text_of)
                .ok_or_else(|| ScrapeError::markup(url, format!("h2 in container #{}", i + 1)))?;

            let href = container
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .ok_or_else(|| {
                    let what = format!("a.{} in container #{}", cfg.link_class, i + 1);
                    ScrapeError::markup(url, what)
                })?;

            tour_items.push(TourItem {
                start_date,
                heading: heading.trim().to_string(),
                href: href.to_string(),
            });
        }
    }

    Ok(GroupPage {
        group_type,
        embedded_classics,
        tour_items,
    })
}

// ── Tour detail page ──────────────────────────────────────────────────────────

/// Rows of the stages table, minus filler rows. No table means no stages.
pub fn count_stages(html: &str, cfg: &BreakdownConfig) -> Result<u32, ScrapeError> {
    let table_sel = selector(
        "breakdown.stages_table_class",
        &class_selector("table", &cfg.stages_table_class),
    )?;

    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(0);
    };

    // Rows of this table's own tbody, never those of an enclosing table.
    let Some(body) = child_elements(table).find(|el| el.value().name() == "tbody") else {
        return Ok(0);
    };
    let count = child_elements(body)
        .filter(|el| el.value().name() == "tr")
        .filter(|row| !contains_any(text_of(*row).trim(), &cfg.stage_exclude_markers))
        .count();

    Ok(count as u32)
}

// ── Classics detail page ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ClassicRow {
    pub ordinal: String,
    pub date: String,
    pub name: String,
    pub category: String,
}

/// Data rows of the first table on the page; the first row is the header.
pub fn parse_classics_table(
    html: &str,
    cols: &ClassicColumns,
    url: &str,
) -> Result<Vec<ClassicRow>, ScrapeError> {
    let table_sel = selector("table", "table")?;
    let row_sel = selector("tr", "tr")?;
    let cell_sel = selector("td", "td")?;

    let doc = Html::parse_document(html);
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::markup(url, "classics table"))?;

    let mut rows = Vec::new();
    for (i, tr) in table.select(&row_sel).enumerate().skip(1) {
        let cells: Vec<String> = tr.select(&cell_sel).map(stripped_text).collect();
        let cell = |col: usize| {
            cells
                .get(col)
                .cloned()
                .ok_or_else(|| ScrapeError::markup(url, format!("column {} in row {}", col, i + 1)))
        };

        rows.push(ClassicRow {
            ordinal: cell(cols.ordinal)?,
            date: cell(cols.date)?,
            name: cell(cols.name)?,
            category: cell(cols.category)?,
        });
    }

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
