//! HTML pages shaped like the live site, matched to `config/default.toml`.

pub const BASE: &str = "https://www.velogames.com/";

pub const INDEX: &str = r#"<html><body>
<nav><a class="gamelink" href="/old-game/">Velogames Old Game</a></nav>
<h1>Latest News</h1>
<h1>  All Contests </h1>
<div class="contests">
  <a class="gamelink" href="tour-de-france/2024/">Velogames Tour de France</a>
  <a class="gamelink" href="tour-de-france-femmes/2024/">Velogames Tour de France Femmes</a>
  <a class="other" href="/about/">About</a>
</div>
</body></html>"#;

pub const INDEX_WITHOUT_HEADING: &str = r#"<html><body>
<h1>Latest News</h1>
<a class="gamelink" href="tour-de-france/2024/">Velogames Tour de France</a>
</body></html>"#;

pub const TDF_GROUP_URL: &str = "https://www.velogames.com/tour-de-france/2024/";
pub const TDF_STAGES_URL: &str = "https://www.velogames.com/tour-de-france/2024/races.php";

pub const TDF_GROUP: &str = r#"<html><body>
<div class="postcontent">
  <h2>Velogames Tour de France 2024</h2>
  <p><span class="race">Stage race</span> <span>29th June
     Florence - Rimini</span></p>
  <a class="button" href="/tour-de-france/2024/">Play now</a>
</div>
</body></html>"#;

pub const FEMMES_GROUP_URL: &str = "https://www.velogames.com/tour-de-france-femmes/2024/";
pub const FEMMES_STAGES_URL: &str =
    "https://www.velogames.com/tour-de-france-femmes/2024/races.php";
pub const WOMENS_CLASSICS_RACES_URL: &str =
    "https://www.velogames.com/womens-classics/2024/races.php";

/// A women's classics game listed as the first "tour" of the page.
pub const FEMMES_GROUP: &str = r#"<html><body>
<div class="postcontent">
  <h2>Velogames Fantasy Womens Classics 2024</h2>
  <p><span class="race">Spring</span> <span>2nd March</span></p>
  <a class="button" href="/womens-classics/2024/">Play now</a>
</div>
<div class="postcontent">
  <h2>Velogames Tour de France Femmes 2024</h2>
  <p><span class="race">Stage race</span> <span>12th August</span></p>
  <a class="button" href="/tour-de-france-femmes/2024/">Play now</a>
</div>
</body></html>"#;

pub const CLASSICS_GROUP_URL: &str = "https://www.velogames.com/spring-classics/2024/";
pub const CLASSICS_RACES_URL: &str = "https://www.velogames.com/spring-classics/2024/races.php";

/// Heading mentions a tour, but no tour marker: still classics.
pub const CLASSICS_GROUP: &str = r#"<html><body>
<div class="postcontent">
  <h2>Velogames Spring Classics 2024 - Tour of Flanders included</h2>
  <p><span>Pick 9 riders</span></p>
  <a class="button" href="/spring-classics/2024/">Play now</a>
</div>
</body></html>"#;

/// First ordinal cell reproduces the glued-date defect.
pub const CLASSICS_RACES: &str = r#"<html><body>
<table>
  <tr><th>#</th><th>Date</th><th>Race</th><th>Category</th></tr>
  <tr><td>1<b>2024-03-02 00:00:00</b>Strade Bianche</td><td>02/03/2024</td><td> Strade Bianche </td><td>Cat A</td></tr>
  <tr><td>2</td><td>16/03/2024</td><td>Milano-Sanremo</td><td>Monument M</td></tr>
  <tr><td>3</td><td>07/04/2024</td><td>Paris-Roubaix</td><td>Monument M</td></tr>
</table>
</body></html>"#;

pub const WOMENS_CLASSICS_RACES: &str = r#"<html><body>
<table>
  <tr><th>#</th><th>Date</th><th>Race</th><th>Category</th></tr>
  <tr><td>1</td><td>02/03/2024</td><td>Strade Bianche Donne</td><td>Cat A</td></tr>
  <tr><td>2</td><td>31/03/2024</td><td>Ronde van Vlaanderen</td><td>Cat A</td></tr>
</table>
</body></html>"#;

/// Stage table with `stages` real rows plus the filler rows the site adds.
pub fn stages_page(stages: u32) -> String {
    let mut rows = String::new();
    for n in 1..=stages {
        rows.push_str(&format!(
            "<tr><td>Stage {n}</td><td>Start {n} - Finish {n}</td></tr>\n"
        ));
    }
    format!(
        r#"<html><body>
<table class="responsive">
  <thead><tr><th>Stage</th><th>Route</th></tr></thead>
  <tbody>
{rows}  <tr><td>NULL</td><td></td></tr>
  <tr><td>End-Of-Tour</td><td>Final classification</td></tr>
  </tbody>
</table>
</body></html>"#
    )
}

/// Stages table nested in a layout table, as some race pages are built.
pub fn nested_stages_page(stages: u32) -> String {
    let rows: String = (1..=stages)
        .map(|n| format!("<tr><td>Stage {n}</td><td>Start {n} - Finish {n}</td></tr>"))
        .collect();
    format!(
        r#"<html><body>
<table class="layout"><tbody><tr><td>
  <table class="responsive">
    <thead><tr><th>Stage</th><th>Route</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
</td></tr></tbody></table>
</body></html>"#
    )
}

pub const NO_STAGES_TABLE: &str = r#"<html><body><p>Route to be announced</p></body></html>"#;
