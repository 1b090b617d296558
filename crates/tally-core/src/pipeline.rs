//! Parsing orchestrator: OCR text in, structured receipt out.
//!
//! The AI collaborator, when configured, gets the first shot; its validated
//! output is merged with learned overrides. Otherwise the deterministic
//! pipeline runs: garble detection, recovery substitution when the text is
//! hopeless, extraction, store identification (with the optional online
//! tier), then per-item override lookup, enhancement, and classification.
//! Collaborator failures are logged and absorbed; parsing always proceeds.

use tracing::{debug, info, warn};

use crate::ai::{AiClient, ExtractionBackend};
use crate::classify::{classify, ClassifyContext};
use crate::db::Database;
use crate::enhance::enhance;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::garble::detect;
use crate::geocode::GeocodeClient;
use crate::models::{
    ClassifiedItem, ParseSource, ParsedReceipt, ReceiptMetadata, StoreIdentity, StoreSource,
    SuggestedAction,
};
use crate::patterns::DATE_LINE;
use crate::recovery::recover;
use crate::registry::chain_format;
use crate::stores::{best_address_match, extract_address, identify, ONLINE_FALLBACK_THRESHOLD};

/// Largest OCR payload accepted, in bytes
pub const MAX_INPUT_BYTES: usize = 64 * 1024;

/// Inputs shorter than this can't be a receipt and go straight to recovery
const MIN_INPUT_CHARS: usize = 10;

/// Declared totals deviating from the kept sum by more than this fraction
/// are replaced by the recomputed sum
const TOTAL_DEVIATION_RATIO: f64 = 0.5;

/// Enhancer base confidence when the store is known
const BASE_CONFIDENCE_KNOWN_STORE: f64 = 0.8;

/// Enhancer base confidence when the store is unknown
const BASE_CONFIDENCE_UNKNOWN_STORE: f64 = 0.7;

/// Store identity used when every tier came up empty
fn unknown_store() -> StoreIdentity {
    StoreIdentity {
        name: "UNKNOWN".to_string(),
        confidence: 0.0,
        source: StoreSource::Keyword,
    }
}

/// Receipt parsing orchestrator
#[derive(Clone)]
pub struct ReceiptParser {
    db: Database,
    ai: Option<AiClient>,
    geocoder: Option<GeocodeClient>,
}

impl ReceiptParser {
    /// Deterministic-only parser
    pub fn new(db: Database) -> Self {
        Self {
            db,
            ai: None,
            geocoder: None,
        }
    }

    /// Parser with optional collaborators
    pub fn with_collaborators(
        db: Database,
        ai: Option<AiClient>,
        geocoder: Option<GeocodeClient>,
    ) -> Self {
        Self { db, ai, geocoder }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Parse OCR text into a structured receipt.
    ///
    /// `store_hint` overrides store identification entirely.
    pub async fn parse(&self, text: &str, store_hint: Option<&str>) -> Result<ParsedReceipt> {
        if text.len() > MAX_INPUT_BYTES {
            return Err(Error::InvalidInput(format!(
                "input of {} bytes exceeds the {} byte limit",
                text.len(),
                MAX_INPUT_BYTES
            )));
        }

        if let Some(ref ai) = self.ai {
            match ai.extract_receipt(text, store_hint).await {
                Ok(receipt) => return self.assemble_ai(text, receipt, store_hint).await,
                Err(e) => {
                    warn!(error = %e, "AI extraction failed, falling back to rules");
                }
            }
        }

        self.parse_deterministic(text, store_hint).await
    }

    /// The rule pipeline: garble check, recovery, extraction, assembly
    async fn parse_deterministic(
        &self,
        text: &str,
        store_hint: Option<&str>,
    ) -> Result<ParsedReceipt> {
        let mut source = ParseSource::Rules;
        let mut recovered_chain = None;
        let mut working = text.to_string();

        let report = detect(text);
        if report.garbled || text.trim().len() < MIN_INPUT_CHARS {
            debug!(
                garbled_lines = report.garbled_lines,
                valid_lines = report.valid_lines,
                extreme = report.extreme_indicators,
                "text unusable, substituting recovery output"
            );
            let recovered = recover(text);
            recovered_chain = recovered.chain;
            working = recovered.text;
            source = ParseSource::Synthetic;
        }

        let mut extraction = extract(&working);
        if extraction.items.is_empty() && source == ParseSource::Rules {
            debug!("extraction found nothing, substituting recovery output");
            let recovered = recover(text);
            recovered_chain = recovered.chain;
            working = recovered.text;
            source = ParseSource::Synthetic;
            extraction = extract(&working);
        }

        let store = self
            .resolve_store(&working, store_hint, recovered_chain)
            .await;

        let total_lines = working.lines().count();
        let store_known = store.confidence > 0.0;
        let base_confidence = if store_known {
            BASE_CONFIDENCE_KNOWN_STORE
        } else {
            BASE_CONFIDENCE_UNKNOWN_STORE
        };

        let mut items = Vec::with_capacity(extraction.items.len());
        for extracted in &extraction.items {
            let ctx = ClassifyContext {
                line_index: extracted.line_index,
                total_lines,
                store: store_known.then_some(store.name.as_str()),
            };

            if let Some(item) = self.assemble_item(
                &store,
                store_known,
                base_confidence,
                &extracted.raw_name,
                extracted.price,
                ctx,
            )? {
                items.push(item);
            }
        }

        Ok(self.finish(working.as_str(), store, items, extraction.declared_total, source))
    }

    /// Assemble one deterministic item: override lookup, enhancement,
    /// classification. Returns None when the name fails validation.
    fn assemble_item(
        &self,
        store: &StoreIdentity,
        store_known: bool,
        base_confidence: f64,
        raw_name: &str,
        price: f64,
        ctx: ClassifyContext,
    ) -> Result<Option<ClassifiedItem>> {
        let override_hit = if store_known {
            self.db.lookup_override(&store.name, raw_name)?
        } else {
            None
        };

        if let Some(hit) = override_hit {
            if hit.is_hidden() {
                let enhancement = enhance(raw_name, Some(&store.name), base_confidence);
                return Ok(Some(ClassifiedItem {
                    raw_name: raw_name.to_string(),
                    enhanced_name: if enhancement.name.is_empty() {
                        raw_name.to_string()
                    } else {
                        enhancement.name
                    },
                    category: enhancement.category,
                    price,
                    line_index: ctx.line_index,
                    confidence: 1.0,
                    is_non_food: true,
                    suggested_action: SuggestedAction::Hide,
                    should_hide: true,
                    learned: true,
                }));
            }

            // learned rename: trusted over the automatic enhancer
            let cls = classify(raw_name, price, ctx);
            let category = crate::dictionaries::categorize(&hit.corrected_text);
            return Ok(Some(ClassifiedItem {
                raw_name: raw_name.to_string(),
                enhanced_name: hit.corrected_text,
                category,
                price,
                line_index: ctx.line_index,
                confidence: 1.0,
                is_non_food: cls.is_non_food,
                suggested_action: cls.action,
                should_hide: cls.action == SuggestedAction::Hide,
                learned: true,
            }));
        }

        let enhancement = enhance(
            raw_name,
            store_known.then_some(store.name.as_str()),
            base_confidence,
        );
        if enhancement.name.is_empty() {
            debug!(raw_name, "dropping item rejected by name validation");
            return Ok(None);
        }

        let cls = classify(raw_name, price, ctx);
        Ok(Some(ClassifiedItem {
            raw_name: raw_name.to_string(),
            enhanced_name: enhancement.name,
            category: enhancement.category,
            price,
            line_index: ctx.line_index,
            confidence: enhancement.confidence.min(1.0),
            is_non_food: cls.is_non_food,
            suggested_action: cls.action,
            should_hide: cls.action == SuggestedAction::Hide,
            learned: false,
        }))
    }

    /// Assemble a validated AI extraction into the final receipt shape.
    ///
    /// Learned overrides still win over the AI's enhanced names, and the
    /// rule classifier still decides hide/review actions.
    async fn assemble_ai(
        &self,
        text: &str,
        receipt: crate::ai::AiReceipt,
        store_hint: Option<&str>,
    ) -> Result<ParsedReceipt> {
        let store = match (store_hint, &receipt.store_name) {
            (Some(hint), _) => StoreIdentity {
                name: hint.to_uppercase(),
                confidence: 1.0,
                source: StoreSource::Keyword,
            },
            (None, Some(name)) => StoreIdentity {
                name: name.to_uppercase(),
                confidence: 0.9,
                source: StoreSource::Keyword,
            },
            (None, None) => self.resolve_store(text, None, None).await,
        };

        let store_known = store.confidence > 0.0;
        let total_lines = text.lines().count();
        let mut items = Vec::with_capacity(receipt.items.len());

        for (idx, ai_item) in receipt.items.into_iter().enumerate() {
            let ctx = ClassifyContext {
                line_index: idx,
                total_lines,
                store: store_known.then_some(store.name.as_str()),
            };

            let override_hit = if store_known {
                self.db.lookup_override(&store.name, &ai_item.raw_name)?
            } else {
                None
            };

            let cls = classify(&ai_item.raw_name, ai_item.price, ctx);
            let item = match override_hit {
                Some(hit) if hit.is_hidden() => ClassifiedItem {
                    raw_name: ai_item.raw_name,
                    enhanced_name: ai_item.enhanced_name,
                    category: ai_item.category,
                    price: ai_item.price,
                    line_index: idx,
                    confidence: 1.0,
                    is_non_food: true,
                    suggested_action: SuggestedAction::Hide,
                    should_hide: true,
                    learned: true,
                },
                Some(hit) => {
                    let category = crate::dictionaries::categorize(&hit.corrected_text);
                    ClassifiedItem {
                        raw_name: ai_item.raw_name,
                        enhanced_name: hit.corrected_text,
                        category,
                        price: ai_item.price,
                        line_index: idx,
                        confidence: 1.0,
                        is_non_food: cls.is_non_food,
                        suggested_action: cls.action,
                        should_hide: cls.action == SuggestedAction::Hide,
                        learned: true,
                    }
                }
                None => {
                    let is_non_food = ai_item.is_non_food || cls.is_non_food;
                    let action = if cls.action == SuggestedAction::Keep && ai_item.is_non_food {
                        SuggestedAction::Review
                    } else {
                        cls.action
                    };
                    ClassifiedItem {
                        raw_name: ai_item.raw_name,
                        enhanced_name: ai_item.enhanced_name,
                        category: ai_item.category,
                        price: ai_item.price,
                        line_index: idx,
                        confidence: ai_item.confidence,
                        is_non_food,
                        suggested_action: action,
                        should_hide: action == SuggestedAction::Hide,
                        learned: false,
                    }
                }
            };
            items.push(item);
        }

        Ok(self.finish(text, store, items, receipt.total, ParseSource::Ai))
    }

    /// Tiered store resolution, including the optional online fallback
    async fn resolve_store(
        &self,
        text: &str,
        store_hint: Option<&str>,
        recovered_chain: Option<&'static str>,
    ) -> StoreIdentity {
        if let Some(hint) = store_hint {
            return StoreIdentity {
                name: hint.to_uppercase(),
                confidence: 1.0,
                source: StoreSource::Keyword,
            };
        }
        if let Some(chain) = recovered_chain {
            return StoreIdentity {
                name: chain.to_string(),
                confidence: 0.9,
                source: StoreSource::Keyword,
            };
        }

        let local = identify(text);
        if let Some(ref id) = local {
            if id.confidence >= ONLINE_FALLBACK_THRESHOLD {
                return id.clone();
            }
        }

        // online tier: only when address data exists and local scoring is weak
        if let Some(ref geocoder) = self.geocoder {
            let addr = extract_address(text);
            if addr.has_data() {
                match geocoder.lookup_store(&addr.to_query()).await {
                    Ok(Some(online)) => {
                        let local_confidence = local.as_ref().map(|i| i.confidence).unwrap_or(0.0);
                        if online.confidence > local_confidence {
                            info!(chain = %online.name, "store identified by online lookup");
                            return online;
                        }
                    }
                    Ok(None) => debug!("online lookup had no answer"),
                    Err(e) => warn!(error = %e, "online store lookup failed"),
                }
            }
        }

        local.unwrap_or_else(unknown_store)
    }

    /// Total reconciliation, metadata assembly, and the final receipt
    fn finish(
        &self,
        working_text: &str,
        store: StoreIdentity,
        items: Vec<ClassifiedItem>,
        declared_total: Option<f64>,
        source: ParseSource,
    ) -> ParsedReceipt {
        let mut receipt = ParsedReceipt {
            store_name: store.name.clone(),
            store,
            items,
            total: 0.0,
            metadata: ReceiptMetadata {
                date: None,
                location: None,
                store_format: "unknown".to_string(),
                item_count: 0,
            },
            source,
        };

        let kept_sum = receipt.kept_sum();
        receipt.total = match declared_total {
            Some(declared)
                if declared > 0.0
                    && (declared - kept_sum).abs() <= kept_sum * TOTAL_DEVIATION_RATIO =>
            {
                declared
            }
            Some(declared) => {
                debug!(
                    declared,
                    kept_sum, "declared total implausible, using recomputed sum"
                );
                kept_sum
            }
            None => kept_sum,
        };

        receipt.metadata.date = DATE_LINE
            .find(working_text)
            .map(|m| m.as_str().to_string());
        let addr = extract_address(working_text);
        receipt.metadata.location = best_address_match(&addr)
            .filter(|(loc, score)| *score > 0.6 && loc.chain == receipt.store_name)
            .map(|(loc, _)| format!("{}, {}", loc.city, loc.state));
        receipt.metadata.store_format = chain_format(&receipt.store_name).to_string();
        receipt.metadata.item_count = receipt.items.iter().filter(|i| i.is_kept()).count();

        info!(
            store = %receipt.store_name,
            items = receipt.items.len(),
            kept = receipt.metadata.item_count,
            total = receipt.total,
            source = receipt.source.as_str(),
            "receipt parsed"
        );
        receipt
    }
}
