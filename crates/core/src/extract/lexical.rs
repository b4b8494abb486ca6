//! Regex-cascade detection of monetary amounts and furniture nouns.
//!
//! Supplier messages are mostly Spanish with the occasional English noun,
//! so the pattern tables carry both. Everything here is pure and
//! deterministic; the oracle fallback lives in `cotiza-agent`.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::extraction::{DetectionMethod, ExtractedAmount};
use crate::domain::product::{DetectedProduct, ProductAttributes, ProductCategory};

/// Brands suppliers tend to name-drop. Matched case-insensitively against
/// the whole message.
const BRAND_GAZETTEER: &[&str] = &[
    "Herman Miller",
    "Steelcase",
    "Knoll",
    "Vitra",
    "Eames",
    "Ikea",
    "Aeron",
    "DXRacer",
    "Secretlab",
    "Autonomous",
    "Uplift",
];

/// Upper bound for the permissive bare-number fallback. Anything at or
/// above this is assumed to be a phone number, date, or quantity.
const FALLBACK_CEILING: i64 = 100_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub amounts: Vec<ExtractedAmount>,
    pub products: Vec<DetectedProduct>,
}

struct CategoryPattern {
    category: ProductCategory,
    noun: Regex,
    material: Regex,
    style: Regex,
    feature: Regex,
}

pub struct LexicalMatcher {
    amount_families: Vec<Regex>,
    price_keyword: Regex,
    bare_number: Regex,
    categories: Vec<CategoryPattern>,
}

impl Default for LexicalMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalMatcher {
    pub fn new() -> Self {
        // Five ordered families: currency-prefixed, currency-suffixed,
        // symbol-adjacent, labelled, contextual. All of them run; results
        // de-duplicate by numeric value in first-seen order.
        let amount_families = vec![
            rx(r"(?i)\b(?:bs\.?|usd|us\$)\s*(\d{1,6}(?:[.,]\d{1,2})?)"),
            rx(r"(?i)\b(\d{1,6}(?:[.,]\d{1,2})?)\s*(?:bs\b|bolivianos?\b|pesos?\b|d[oó]lares?\b|usd\b)"),
            rx(r"[$€]\s*(\d{1,6}(?:[.,]\d{1,2})?)|(\d{1,6}(?:[.,]\d{1,2})?)\s*[$€]"),
            rx(r"(?i)\b(?:precio|costo|valor)\s*:\s*\$?\s*(\d{1,6}(?:[.,]\d{1,2})?)"),
            rx(r"(?i)\b(\d{1,6}(?:[.,]\d{1,2})?)\s*(?:cada\b|por\s+unidad\b|la\s+unidad\b|c/u)"),
        ];

        Self {
            amount_families,
            price_keyword: rx(r"(?i)precio|costo|valor|cotizaci[oó]n|d[oó]lar|boliviano|peso|\bbs\b|[$€]"),
            bare_number: rx(r"\b(\d{1,6}(?:[.,]\d{1,2})?)\b"),
            categories: category_table(),
        }
    }

    /// Pure scan of one message. No I/O, same input always yields the same
    /// outcome.
    pub fn scan(&self, text: &str) -> MatchOutcome {
        MatchOutcome { amounts: self.scan_amounts(text), products: self.scan_products(text) }
    }

    fn scan_amounts(&self, text: &str) -> Vec<ExtractedAmount> {
        let mut amounts: Vec<ExtractedAmount> = Vec::new();

        for family in &self.amount_families {
            for captures in family.captures_iter(text) {
                let Some(group) = captures.get(1).or_else(|| captures.get(2)) else {
                    continue;
                };
                let Some(value) = parse_amount(group.as_str()) else {
                    continue;
                };
                if amounts.iter().any(|amount| amount.value == value) {
                    continue;
                }
                amounts.push(ExtractedAmount {
                    value,
                    raw_text: captures
                        .get(0)
                        .map(|whole| whole.as_str().trim().to_string())
                        .unwrap_or_else(|| group.as_str().to_string()),
                    method: DetectionMethod::Pattern,
                });
            }
        }

        // Permissive fallback: the message talks about prices but no family
        // matched, so consider bare numbers within a sane range.
        if amounts.is_empty() && self.price_keyword.is_match(text) {
            let ceiling = Decimal::from(FALLBACK_CEILING);
            for captures in self.bare_number.captures_iter(text) {
                let Some(group) = captures.get(1) else { continue };
                let Some(value) = parse_amount(group.as_str()) else { continue };
                if value <= Decimal::ZERO || value >= ceiling {
                    continue;
                }
                if amounts.iter().any(|amount| amount.value == value) {
                    continue;
                }
                amounts.push(ExtractedAmount {
                    value,
                    raw_text: group.as_str().to_string(),
                    method: DetectionMethod::Pattern,
                });
            }
        }

        amounts
    }

    fn scan_products(&self, text: &str) -> Vec<DetectedProduct> {
        let mut products = Vec::new();

        for pattern in &self.categories {
            // First occurrence only: at most one product per category per
            // message.
            let Some(span) = pattern.noun.find(text) else {
                continue;
            };

            let attributes = ProductAttributes {
                material: collect_unique(&pattern.material, text),
                style: collect_unique(&pattern.style, text),
                brand: brand_lookup(text),
                features: collect_unique(&pattern.feature, text),
            };

            products.push(DetectedProduct {
                category: pattern.category,
                display_name: capitalize(span.as_str().trim()),
                attributes,
                context: context_snippet(text, span.start(), span.end()),
            });
        }

        products
    }
}

/// Secondary lightweight noun lookup used by the assembler when the main
/// category table found nothing but an amount was detected anyway.
pub struct CommonTerms {
    terms: Vec<(Regex, ProductCategory, &'static str)>,
}

impl Default for CommonTerms {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonTerms {
    pub fn new() -> Self {
        let terms = vec![
            (rx(r"(?i)\bsillas?\b"), ProductCategory::Chair, "Silla"),
            (rx(r"(?i)\bescritorios?\b"), ProductCategory::Desk, "Escritorio"),
            (rx(r"(?i)\bmesas?\b"), ProductCategory::Desk, "Mesa"),
            (rx(r"(?i)\bpupitres?\b"), ProductCategory::Desk, "Pupitre"),
            (rx(r"(?i)\bmez[oó]n(?:es)?\b|\bmostrador(?:es)?\b"), ProductCategory::Counter, "Mezón"),
            (rx(r"(?i)\bl[aá]mparas?\b|\bluminarias?\b"), ProductCategory::Lamp, "Lámpara"),
            (rx(r"(?i)\btaburetes?\b|\bbanquetas?\b|\bbancos?\b"), ProductCategory::Stool, "Taburete"),
            (rx(r"(?i)\bbancas?\b"), ProductCategory::Stool, "Banca"),
            (rx(r"(?i)\bcasilleros?\b|\blockers?\b|\btaquillas?\b"), ProductCategory::Locker, "Casillero"),
            (rx(r"(?i)\barmarios?\b|\bclosets?\b|\broperos?\b"), ProductCategory::Armoire, "Armario"),
            (rx(r"(?i)\bcajoneras?\b|\bgaveteros?\b"), ProductCategory::Armoire, "Cajonera"),
            (rx(r"(?i)\bgabinetes?\b"), ProductCategory::Armoire, "Gabinete"),
            (rx(r"(?i)\bestanter[ií]as?\b|\bestantes?\b|\brepisas?\b"), ProductCategory::Shelf, "Estantería"),
            (rx(r"(?i)\blibreros?\b"), ProductCategory::Shelf, "Librero"),
            (rx(r"(?i)\bvitrinas?\b"), ProductCategory::Shelf, "Vitrina"),
            (rx(r"(?i)\bsill[oó]n(?:es)?\b|\bsof[aá]s?\b|\bpoltronas?\b"), ProductCategory::Sofa, "Sillón"),
            (rx(r"(?i)\barchivador(?:es)?\b|\barchivos?\b"), ProductCategory::FilingCabinet, "Archivador"),
            (rx(r"(?i)\bpizarras?\b|\bwhiteboards?\b|\btableros?\b"), ProductCategory::Whiteboard, "Pizarra"),
            (rx(r"(?i)\bpercheros?\b|\bcolgador(?:es)?\b"), ProductCategory::CoatRack, "Perchero"),
        ];

        Self { terms }
    }

    /// At most one hit per category, in table order.
    pub fn lookup(&self, text: &str) -> Vec<(ProductCategory, String)> {
        let mut hits: Vec<(ProductCategory, String)> = Vec::new();
        for (pattern, category, display_name) in &self.terms {
            if hits.iter().any(|(seen, _)| seen == category) {
                continue;
            }
            if pattern.is_match(text) {
                hits.push((*category, (*display_name).to_string()));
            }
        }
        hits
    }
}

/// ±100-character window around the first occurrence of a numeric literal,
/// used as the description of a price-only quote.
pub fn amount_context(text: &str, raw_amount: &str) -> String {
    let needle = raw_amount.trim();
    let Some(index) = text.find(needle) else {
        return text.trim().to_string();
    };
    let from = floor_char_boundary(text, index.saturating_sub(100));
    let to = ceil_char_boundary(text, (index + needle.len() + 100).min(text.len()));
    text[from..to].trim().to_string()
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

fn brand_lookup(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    BRAND_GAZETTEER
        .iter()
        .find(|brand| lowered.contains(&brand.to_lowercase()))
        .map(|brand| (*brand).to_string())
}

fn collect_unique(pattern: &Regex, text: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for span in pattern.find_iter(text) {
        let value = span.as_str().to_lowercase();
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

/// 50 characters of raw text before the span and 100 past its end, clamped
/// to char boundaries so accented text never splits a code point.
fn context_snippet(text: &str, start: usize, end: usize) -> String {
    let from = floor_char_boundary(text, start.saturating_sub(50));
    let to = ceil_char_boundary(text, (end + 100).min(text.len()));
    text[from..to].trim().to_string()
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

fn category_table() -> Vec<CategoryPattern> {
    vec![
        CategoryPattern {
            category: ProductCategory::Chair,
            noun: rx(r"(?i)\bsillas?\b|\bchairs?\b|\basientos?\b"),
            material: rx(r"(?i)cuero|tela|mesh|pl[aá]stico|madera|aluminio|acero"),
            style: rx(r"(?i)ergon[oó]mica|ejecutiva|gamer|moderna|cl[aá]sica|industrial|minimalista|tapizada|giratoria"),
            feature: rx(r"(?i)altura ajustable|reposabrazos|ruedas|apoyo lumbar|base cromada"),
        },
        CategoryPattern {
            category: ProductCategory::Desk,
            noun: rx(r"(?i)\bescritorios?\b|\bdesks?\b|\bmesas?\b|\bpupitres?\b"),
            material: rx(r"(?i)madera|vidrio|metal|acero|aluminio|bamb[uú]|mdf|laminado"),
            style: rx(r"(?i)ejecutivo|gamer|standing|regulable|el[eé]ctrico|modular|compacto"),
            feature: rx(r"(?i)altura ajustable|motor el[eé]ctrico|gavetas|estantes|superficie amplia"),
        },
        CategoryPattern {
            category: ProductCategory::Counter,
            noun: rx(r"(?i)\bmez[oó]n(?:es)?\b|\bmostrador(?:es)?\b|\bcounter\b"),
            material: rx(r"(?i)madera|granito|m[aá]rmol|cuarzo|acero|laminado|formica"),
            style: rx(r"(?i)moderno|cl[aá]sico|industrial|minimalista|r[uú]stico"),
            feature: rx(r"(?i)con lavabo|esquinero|tipo isla|empotrado"),
        },
        CategoryPattern {
            category: ProductCategory::Lamp,
            noun: rx(r"(?i)\bl[aá]mparas?\b|\bluminarias?\b"),
            material: rx(r"(?i)metal|vidrio|madera|pl[aá]stico|cristal|acero"),
            style: rx(r"(?i)moderna|cl[aá]sica|industrial|vintage|minimalista|colgante|de pie|de mesa"),
            feature: rx(r"(?i)regulable|con dimmer|ahorradora|led|sensor de movimiento"),
        },
        CategoryPattern {
            category: ProductCategory::Stool,
            noun: rx(r"(?i)\btaburetes?\b|\bbanquetas?\b|\bbancos?\b|\bbancas?\b"),
            material: rx(r"(?i)madera|metal|acero|cuero|tela|pl[aá]stico"),
            style: rx(r"(?i)moderno|industrial|cl[aá]sico|de bar|alto|bajo|giratorio"),
            feature: rx(r"(?i)altura ajustable|con respaldo|sin respaldo|apilable|plegable"),
        },
        CategoryPattern {
            category: ProductCategory::Locker,
            noun: rx(r"(?i)\bcasilleros?\b|\blockers?\b|\btaquillas?\b"),
            material: rx(r"(?i)metal|acero|madera|laminado"),
            style: rx(r"(?i)individual|doble|triple|con cerradura|sin cerradura"),
            feature: rx(r"(?i)con llave|con candado|ventilado|reforzado|apilable"),
        },
        CategoryPattern {
            category: ProductCategory::Armoire,
            noun: rx(r"(?i)\barmarios?\b|\bclosets?\b|\bgabinetes?\b|\bcajoneras?\b|\broperos?\b"),
            material: rx(r"(?i)madera|metal|acero|mdf|laminado"),
            style: rx(r"(?i)ejecutivo|modular|de pared|de piso|con espejo|con puertas|sin puertas"),
            feature: rx(r"(?i)puertas corredizas|con llave|iluminado|estantes ajustables"),
        },
        CategoryPattern {
            category: ProductCategory::Shelf,
            noun: rx(r"(?i)\bestanter[ií]as?\b|\bestantes?\b|\brepisas?\b|\blibreros?\b|\bshelving\b"),
            material: rx(r"(?i)madera|metal|acero|vidrio|mdf"),
            style: rx(r"(?i)modular|flotante|industrial|minimalista|abierto|cerrado"),
            feature: rx(r"(?i)estantes ajustables|carga pesada|desmontable"),
        },
        CategoryPattern {
            category: ProductCategory::Sofa,
            noun: rx(r"(?i)\bsill[oó]n(?:es)?\b|\bsof[aá]s?\b|\bpoltronas?\b"),
            material: rx(r"(?i)cuero|tela|terciopelo|microfibra|lino"),
            style: rx(r"(?i)moderno|cl[aá]sico|chesterfield|escandinavo|industrial"),
            feature: rx(r"(?i)reclinable|cama|esquinero|modular|patas de madera"),
        },
        CategoryPattern {
            category: ProductCategory::FilingCabinet,
            noun: rx(r"(?i)\barchivador(?:es)?\b|\bfiling\s+cabinets?\b"),
            material: rx(r"(?i)metal|acero|madera|laminado"),
            style: rx(r"(?i)vertical|horizontal|rodante|fijo|de piso"),
            feature: rx(r"(?i)con llave|con ruedas|ign[ií]fugo|lateral"),
        },
        CategoryPattern {
            category: ProductCategory::Whiteboard,
            noun: rx(r"(?i)\bpizarras?\b|\bwhiteboards?\b|\btableros?\b"),
            material: rx(r"(?i)acero|acr[ií]lico|vidrio|corcho|magn[eé]tico"),
            style: rx(r"(?i)de pared|con tr[ií]pode|rodante|con marco"),
            feature: rx(r"(?i)borrable|magn[eé]tico|con soporte|plegable|port[aá]til"),
        },
        CategoryPattern {
            category: ProductCategory::CoatRack,
            noun: rx(r"(?i)\bpercheros?\b|\bcolgador(?:es)?\b"),
            material: rx(r"(?i)madera|metal|acero|pl[aá]stico"),
            style: rx(r"(?i)de pie|de pared|de puerta|moderno|cl[aá]sico"),
            feature: rx(r"(?i)giratorio|m[uú]ltiple|con repisa|con espejo"),
        },
    ]
}
