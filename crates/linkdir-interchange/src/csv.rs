//! A deliberately simple CSV dialect: one record per line, fields split on
//! every comma, surrounding quotes stripped. Quoted commas and multi-line
//! fields are not supported, so the exporter replaces those characters.

use crate::{InterchangeError, Parsed};
use linkdir_core::{Link, LinkCandidate};
use tracing::debug;

pub const COLUMNS: [&str; 8] = [
    "name",
    "description",
    "category",
    "color",
    "tags",
    "production_url",
    "staging_url",
    "integration_url",
];

const TAG_SEPARATOR: &str = ";";

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(field)
        .trim()
}

/// Column positions taken from the header row.
#[derive(Debug, Default)]
struct Header {
    positions: [Option<usize>; COLUMNS.len()],
}

impl Header {
    fn parse(line: &str) -> Result<Self, InterchangeError> {
        let mut header = Header::default();
        for (index, raw) in line.split(',').enumerate() {
            let name = unquote(raw).to_ascii_lowercase();
            if let Some(column) = COLUMNS.iter().position(|c| *c == name) {
                if header.positions[column].is_none() {
                    header.positions[column] = Some(index);
                }
            }
        }
        if header.positions[0].is_none() && header.positions[5].is_none() {
            return Err(InterchangeError::MissingColumns(
                "name, production_url".to_string(),
            ));
        }
        Ok(header)
    }

    fn field<'a>(&self, fields: &[&'a str], column: &str) -> Option<&'a str> {
        let column = COLUMNS.iter().position(|c| *c == column)?;
        let index = self.positions[column]?;
        fields
            .get(index)
            .map(|field| unquote(field))
            .filter(|field| !field.is_empty())
    }
}

/// Parses a CSV export. The first non-blank line is the header; column
/// names are matched ignoring case, unknown columns are ignored. A leading
/// byte order mark is skipped.
///
/// Rows with neither a name nor a production URL are dropped and counted.
pub fn parse_csv(contents: &str) -> Result<Parsed, InterchangeError> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
    let header = Header::parse(lines.next().ok_or(InterchangeError::Empty)?)?;

    let mut parsed = Parsed::default();
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let name = header.field(&fields, "name");
        let production = header.field(&fields, "production_url");
        if name.is_none() && production.is_none() {
            parsed.dropped += 1;
            continue;
        }

        let owned = |column: &str| header.field(&fields, column).map(str::to_string);
        parsed.links.push(LinkCandidate {
            name: name.unwrap_or_default().to_string(),
            production: production.unwrap_or_default().to_string(),
            staging: owned("staging_url"),
            integration: owned("integration_url"),
            category: owned("category"),
            color: owned("color"),
            description: owned("description"),
            tags: header
                .field(&fields, "tags")
                .map(|tags| {
                    tags.split(TAG_SEPARATOR)
                        .map(str::trim)
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        });
    }

    debug!(
        links = parsed.links.len(),
        dropped = parsed.dropped,
        "parsed csv file"
    );
    Ok(parsed)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '"' => '\'',
            ',' | '\r' | '\n' => ' ',
            c => c,
        })
        .collect()
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", sanitize(value))
}

/// Writes one row per link with the columns [`parse_csv`] understands.
pub fn export_csv(links: &[Link]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');

    for link in links {
        let tags = link
            .tags
            .iter()
            .map(|tag| tag.replace(TAG_SEPARATOR, " "))
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR);
        let env = &link.environments;
        let row = [
            link.name.as_str(),
            link.description.as_deref().unwrap_or_default(),
            link.category.as_str(),
            link.color.as_deref().unwrap_or_default(),
            tags.as_str(),
            env.production.as_str(),
            env.staging.as_deref().unwrap_or_default(),
            env.integration.as_deref().unwrap_or_default(),
        ];
        out.push_str(&row.map(quoted).join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdir_core::{Environment, Environments};

    #[test]
    fn parses_header_case_insensitively() {
        let csv = "Name,PRODUCTION_URL,Tags,Category\n\
                   \"Grafana\",https://grafana.test,infra; metrics ,Monitoring\n";
        let parsed = parse_csv(csv).unwrap();

        assert_eq!(parsed.links.len(), 1);
        let grafana = &parsed.links[0];
        assert_eq!(grafana.name, "Grafana");
        assert_eq!(grafana.production, "https://grafana.test");
        assert_eq!(grafana.tags, ["infra", "metrics"]);
        assert_eq!(grafana.category.as_deref(), Some("Monitoring"));
        assert_eq!(grafana.staging, None);
    }

    #[test]
    fn keeps_unnamed_rows_with_url_and_drops_empty_ones() {
        let csv = "name,production_url\nFoo,https://foo.test\n,https://bar.test\n,\n";
        let parsed = parse_csv(csv).unwrap();

        let rows: Vec<_> = parsed
            .links
            .iter()
            .map(|c| (c.name.as_str(), c.production.as_str()))
            .collect();
        assert_eq!(rows, [("Foo", "https://foo.test"), ("", "https://bar.test")]);
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn ignores_byte_order_mark() {
        let csv = "\u{feff}name,production_url\r\nFoo,https://foo.test\r\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].name, "Foo");
        assert_eq!(parsed.links[0].production, "https://foo.test");
    }

    #[test]
    fn rejects_empty_input_and_unusable_header() {
        assert_eq!(parse_csv("\n \n").unwrap_err(), InterchangeError::Empty);
        assert!(matches!(
            parse_csv("title,href\nA,https://a.test").unwrap_err(),
            InterchangeError::MissingColumns(_)
        ));
    }

    #[test]
    fn short_rows_leave_missing_columns_empty() {
        let csv = "name,description,production_url\r\nFoo\r\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.links[0].name, "Foo");
        assert_eq!(parsed.links[0].production, "");
        assert_eq!(parsed.links[0].description, None);
    }

    fn link(name: &str, category: &str, tags: &[&str]) -> Link {
        let mut link = Link::builder()
            .name(name)
            .environments(
                Environments::production(format!("https://{}.test", name.to_lowercase()))
                    .with(Environment::Integration, "https://int.test"),
            )
            .category(category)
            .color("#ff0000")
            .build();
        link.tags = tags.iter().map(|t| t.to_string()).collect();
        link
    }

    #[test]
    fn export_then_parse_keeps_core_fields() {
        let mut wiki = link("Wiki", "Docs", &["team", "handbook"]);
        wiki.description = Some("Team wiki".into());
        let links = vec![wiki, link("Jira", "Tools", &[])];

        let parsed = parse_csv(&export_csv(&links)).unwrap();
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.links.len(), links.len());
        for (original, candidate) in links.iter().zip(&parsed.links) {
            assert_eq!(candidate.name, original.name);
            assert_eq!(candidate.production, original.environments.production);
            assert_eq!(candidate.category.as_deref(), Some(original.category.as_str()));
            assert_eq!(candidate.tags, original.tags);
            assert_eq!(candidate.color, original.color);
            assert_eq!(candidate.description, original.description);
            assert_eq!(candidate.integration.as_deref(), Some("https://int.test"));
        }
    }

    #[test]
    fn export_replaces_characters_the_dialect_cannot_carry() {
        let mut odd = link("Odd", "Docs", &[]);
        odd.description = Some("says \"hi\", then\nleaves".into());

        let csv = export_csv(&[odd]);
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"says 'hi'  then leaves\""));

        let parsed = parse_csv(&csv).unwrap();
        assert_eq!(parsed.links[0].description.as_deref(), Some("says 'hi'  then leaves"));
        assert_eq!(parsed.links[0].production, "https://odd.test");
    }
}
