//! Data-driven substitution of listing values into authored HTML templates.
//!
//! Two kinds of markers are recognised, both resolved in one left-to-right pass
//! so that an inserted value is never substituted a second time:
//!
//! - named placeholders: `{{price}}`, `{{living_area}}`, `{{price:raw}}`
//! - literal anchors: sample values baked into an authored template
//!   (e.g. `198 000`) mapped to a field through configuration
//!
//! Unknown placeholders and absent anchors are left untouched; absent listing
//! values are replaced by the locale's "not communicated" marker.

use crate::domain::model::{ListingRecord, Locale};
use crate::utils::error::{PublisherError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Reference,
    Price,
    Currency,
    City,
    PostalCode,
    Latitude,
    Longitude,
    LivingArea,
    PlotArea,
    Rooms,
    Bedrooms,
    EnergyClass,
    GhgClass,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "id" => Field::Id,
            "reference" => Field::Reference,
            "price" => Field::Price,
            "currency" => Field::Currency,
            "city" => Field::City,
            "postal_code" => Field::PostalCode,
            "latitude" => Field::Latitude,
            "longitude" => Field::Longitude,
            "living_area" => Field::LivingArea,
            "plot_area" => Field::PlotArea,
            "rooms" => Field::Rooms,
            "bedrooms" => Field::Bedrooms,
            "energy_class" => Field::EnergyClass,
            "ghg_class" => Field::GhgClass,
            _ => return None,
        };
        Some(field)
    }
}

/// `Display` is the human text; `Raw` is the machine form used inside embedded structured data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    #[default]
    Display,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub literal: String,
    pub field: Field,
    #[serde(default)]
    pub form: Form,
}

// 樣本數字可能以一般空白、不換行空白或窄不換行空白分組
const GROUPING_SPACES: [char; 3] = [' ', '\u{a0}', '\u{202f}'];

pub struct PageRenderer {
    pattern: Regex,
    anchors: HashMap<String, (Field, Form)>,
}

impl PageRenderer {
    pub fn new(anchors: &[Anchor]) -> Result<Self> {
        let mut lookup = HashMap::new();
        for anchor in anchors {
            let canonical = anchor.literal.replace(&GROUPING_SPACES[1..], " ");
            for space in GROUPING_SPACES {
                lookup.insert(
                    canonical.replace(' ', &space.to_string()),
                    (anchor.field, anchor.form),
                );
            }
        }

        // 較長的樣本優先，避免被較短的樣本截斷
        let mut literals: Vec<&String> = lookup.keys().collect();
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let placeholder = r"(?P<placeholder>\{\{\s*(?P<name>[a-z_]+)(?::(?P<form>[a-z]+))?\s*\}\})";
        let source = if literals.is_empty() {
            placeholder.to_string()
        } else {
            let alternatives = literals
                .iter()
                .map(|l| regex::escape(l))
                .collect::<Vec<_>>()
                .join("|");
            format!("{}|(?P<anchor>{})", placeholder, alternatives)
        };

        let pattern = Regex::new(&source).map_err(|e| PublisherError::ConfigError {
            message: format!("Invalid render anchors: {}", e),
        })?;

        Ok(Self {
            pattern,
            anchors: lookup,
        })
    }

    /// Pure and total: identical inputs always give byte-identical output.
    pub fn render(&self, template: &str, listing: &ListingRecord, locale: Locale) -> String {
        self.pattern
            .replace_all(template, |caps: &Captures| {
                let whole = &caps[0];
                match self.marker(caps) {
                    Some((field, form)) => resolve(field, form, listing, locale),
                    None => whole.to_string(),
                }
            })
            .into_owned()
    }

    fn marker(&self, caps: &Captures) -> Option<(Field, Form)> {
        if caps.name("placeholder").is_some() {
            let field = Field::from_name(caps.name("name")?.as_str())?;
            let form = match caps.name("form").map(|m| m.as_str()) {
                None => Form::Display,
                Some("raw") => Form::Raw,
                Some(_) => return None,
            };
            return Some((field, form));
        }

        let anchor = caps.name("anchor")?;
        self.anchors.get(anchor.as_str()).copied()
    }
}

fn resolve(field: Field, form: Form, listing: &ListingRecord, locale: Locale) -> String {
    let value = match field {
        Field::Id => Some(listing.id.clone()),
        Field::Reference => Some(listing.reference.clone()),
        Field::Price => listing.price.as_ref().map(|price| match form {
            Form::Display => group_thousands(price.amount, locale.thousands_separator()),
            Form::Raw => price.amount.to_string(),
        }),
        Field::Currency => listing.price.as_ref().map(|price| price.currency.clone()),
        Field::City => Some(listing.location.city.clone()),
        Field::PostalCode => listing.location.postal_code.clone(),
        // 座標只用於地圖與結構化資料，兩種形式相同
        Field::Latitude => listing.location.latitude.map(|v| v.to_string()),
        Field::Longitude => listing.location.longitude.map(|v| v.to_string()),
        Field::LivingArea => listing.areas.living.map(|v| format_measure(v, form, locale)),
        Field::PlotArea => listing.areas.plot.map(|v| format_measure(v, form, locale)),
        Field::Rooms => listing.rooms.total.map(|n| n.to_string()),
        Field::Bedrooms => listing.rooms.bedrooms.map(|n| n.to_string()),
        Field::EnergyClass => listing.energy.consumption.clone(),
        Field::GhgClass => listing.energy.emissions.clone(),
    };

    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) if form == Form::Display => escape_html(&v),
        Some(v) => v,
        None => locale.missing_marker().to_string(),
    }
}

/// Groups digits by thousands with `separator`, no decimal places.
pub fn group_thousands(amount: u64, separator: &str) -> String {
    group_digits(&amount.to_string(), separator)
}

fn group_digits(digits: &str, separator: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(c);
    }
    grouped
}

fn format_measure(value: f64, form: Form, locale: Locale) -> String {
    let text = format!("{:.2}", value.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };

    let (integer, decimal_separator) = match form {
        Form::Raw => (integer.to_string(), '.'),
        Form::Display => (
            group_digits(integer, locale.thousands_separator()),
            locale.decimal_separator(),
        ),
    };

    if fraction.is_empty() {
        format!("{}{}", sign, integer)
    } else {
        format!("{}{}{}{}", sign, integer, decimal_separator, fraction)
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Areas, EnergyRatings, Location, Price, Rooms};

    fn listing(amount: u64) -> ListingRecord {
        ListingRecord {
            id: "4521".to_string(),
            reference: "ICI-4521".to_string(),
            price: Some(Price {
                amount,
                currency: "EUR".to_string(),
            }),
            location: Location {
                city: "Bergerac".to_string(),
                postal_code: Some("24100".to_string()),
                latitude: Some(44.8512),
                longitude: Some(0.4821),
            },
            areas: Areas {
                living: Some(120.5),
                plot: Some(1500.0),
            },
            rooms: Rooms {
                total: Some(5),
                bedrooms: Some(3),
            },
            energy: EnergyRatings {
                consumption: Some("D".to_string()),
                emissions: Some("B".to_string()),
            },
        }
    }

    fn sample_anchors() -> Vec<Anchor> {
        vec![
            Anchor {
                literal: "198 000".to_string(),
                field: Field::Price,
                form: Form::Display,
            },
            Anchor {
                literal: "198000".to_string(),
                field: Field::Price,
                form: Form::Raw,
            },
            Anchor {
                literal: "3 chambres".to_string(),
                field: Field::Bedrooms,
                form: Form::Display,
            },
        ]
    }

    #[test]
    fn render_is_deterministic() {
        let renderer = PageRenderer::new(&sample_anchors()).unwrap();
        let template = "<p>198 000 €</p><p>{{city}} {{living_area}} m²</p>";
        let listing = listing(250_000);

        let first = renderer.render(template, &listing, Locale::Fr);
        let second = renderer.render(template, &listing, Locale::Fr);
        assert_eq!(first, second);
    }

    #[test]
    fn price_anchor_is_replaced_everywhere() {
        let renderer = PageRenderer::new(&sample_anchors()).unwrap();
        let template = "<h1>198 000 €</h1><span>198\u{a0}000 €</span>";

        let page = renderer.render(template, &listing(250_000), Locale::Fr);

        assert_eq!(page, "<h1>250\u{a0}000 €</h1><span>250\u{a0}000 €</span>");
        assert!(!page.contains("198 000"));
        assert!(!page.contains("198\u{a0}000"));
    }

    #[test]
    fn structured_data_anchor_uses_raw_form() {
        let renderer = PageRenderer::new(&sample_anchors()).unwrap();
        let template = r#"<script type="application/ld+json">{"price": "198000"}</script>"#;

        let page = renderer.render(template, &listing(250_000), Locale::Fr);

        assert_eq!(
            page,
            r#"<script type="application/ld+json">{"price": "250000"}</script>"#
        );
    }

    #[test]
    fn named_placeholders_render_each_field() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let template = "{{reference}}|{{price}}|{{price:raw}}|{{currency}}|{{city}}|{{postal_code}}|\
                        {{latitude}}|{{longitude}}|{{living_area}}|{{living_area:raw}}|{{plot_area}}|\
                        {{rooms}}|{{bedrooms}}|{{energy_class}}|{{ghg_class}}";

        let page = renderer.render(template, &listing(198_000), Locale::Fr);

        assert_eq!(
            page,
            "ICI-4521|198\u{a0}000|198000|EUR|Bergerac|24100|44.8512|0.4821|120,5|120.5|1\u{a0}500|5|3|D|B"
        );
    }

    #[test]
    fn english_locale_uses_comma_grouping() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let page = renderer.render("{{price}} / {{plot_area}}", &listing(1_250_000), Locale::En);
        assert_eq!(page, "1,250,000 / 1,500");
    }

    #[test]
    fn missing_values_render_marker() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let mut listing = listing(198_000);
        listing.energy = EnergyRatings::default();
        listing.price = None;

        let fr = renderer.render("DPE {{energy_class}} / {{price}}", &listing, Locale::Fr);
        assert_eq!(fr, "DPE Non communiqué / Non communiqué");

        let en = renderer.render("DPE {{energy_class}}", &listing, Locale::En);
        assert_eq!(en, "DPE Not communicated");
    }

    #[test]
    fn unknown_placeholders_and_missing_anchors_are_left_alone() {
        let renderer = PageRenderer::new(&sample_anchors()).unwrap();
        let template = "<p>{{agent_name}}</p><p>{{price:fancy}}</p><p>Sample text only</p>";

        let page = renderer.render(template, &listing(250_000), Locale::Fr);

        assert_eq!(page, template);
    }

    #[test]
    fn inserted_values_are_not_substituted_again() {
        let anchors = vec![
            Anchor {
                literal: "198 000".to_string(),
                field: Field::Price,
                form: Form::Display,
            },
            Anchor {
                literal: "250 300".to_string(),
                field: Field::Reference,
                form: Form::Display,
            },
        ];
        let renderer = PageRenderer::new(&anchors).unwrap();

        let page = renderer.render("198 000", &listing(250_300), Locale::Fr);

        assert_eq!(page, "250\u{a0}300");
    }

    #[test]
    fn display_values_are_html_escaped() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let mut listing = listing(198_000);
        listing.location.city = "Brantôme <en> Périgord & co".to_string();

        let page = renderer.render("{{city}}", &listing, Locale::Fr);
        assert_eq!(page, "Brantôme &lt;en&gt; Périgord &amp; co");
    }

    #[test]
    fn quotes_are_escaped_for_attributes() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let mut listing = listing(198_000);
        listing.location.city = "L'Isle-sur-\"Vern\"".to_string();

        let page = renderer.render("<meta content='{{city}}'>", &listing, Locale::Fr);
        assert_eq!(page, "<meta content='L&#39;Isle-sur-&quot;Vern&quot;'>");

        // raw 形式不做跳脫
        let raw = renderer.render("{{reference:raw}}", &listing, Locale::Fr);
        assert_eq!(raw, "ICI-4521");
    }

    #[test]
    fn measures_beyond_u64_are_grouped_not_zeroed() {
        let renderer = PageRenderer::new(&[]).unwrap();
        let mut listing = listing(198_000);
        listing.areas.living = Some(1e20);

        let page = renderer.render("{{living_area}}", &listing, Locale::En);
        assert_eq!(page, "100,000,000,000,000,000,000");
    }

    #[test]
    fn group_thousands_handles_small_and_large_amounts() {
        assert_eq!(group_thousands(0, " "), "0");
        assert_eq!(group_thousands(999, " "), "999");
        assert_eq!(group_thousands(1000, " "), "1 000");
        assert_eq!(group_thousands(12_345_678, ","), "12,345,678");
    }
}
