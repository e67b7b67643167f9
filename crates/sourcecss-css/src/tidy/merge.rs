//! Rule-list passes run on the lowered stylesheet.

use std::collections::HashSet;

use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::PropertyId;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::PrinterOptions;
use lightningcss::traits::ToCss;

/// Drop style rules without declarations and at-rule blocks left empty.
pub(crate) fn prune<R>(rules: &mut CssRuleList<'_, R>) {
    rules.0.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            prune(&mut style.rules);
            !is_empty_block(&style.declarations) || !style.rules.0.is_empty()
        }
        CssRule::Media(media) => {
            prune(&mut media.rules);
            !media.rules.0.is_empty()
        }
        CssRule::Supports(supports) => {
            prune(&mut supports.rules);
            !supports.rules.0.is_empty()
        }
        _ => true,
    });
}

/// Fold each style rule into an earlier rule with an identical declaration
/// block, joining their selector lists at the earlier position.
///
/// A rule only moves when nothing between the two positions declares one of
/// its properties, so the cascade is unchanged. Returns the number of rules
/// folded away.
pub(crate) fn merge<R>(rules: &mut CssRuleList<'_, R>) -> usize {
    let mut merged = 0;
    let mut kept: Vec<CssRule<'_, R>> = Vec::with_capacity(rules.0.len());

    for mut rule in std::mem::take(&mut rules.0) {
        match &mut rule {
            CssRule::Media(media) => merged += merge(&mut media.rules),
            CssRule::Supports(supports) => merged += merge(&mut supports.rules),
            _ => {}
        }

        if let CssRule::Style(style) = &rule {
            if let Some(index) = merge_target(&kept, style) {
                if let CssRule::Style(target) = &mut kept[index] {
                    for selector in style.selectors.0.iter() {
                        if !target.selectors.0.contains(selector) {
                            target.selectors.0.push(selector.clone());
                        }
                    }
                    merged += 1;
                    continue;
                }
            }
        }

        kept.push(rule);
    }

    rules.0 = kept;
    merged
}

/// Nearest earlier rule `rule` can join, scanning back until a rule that
/// touches the same properties.
fn merge_target<R>(earlier: &[CssRule<'_, R>], rule: &StyleRule<'_, R>) -> Option<usize> {
    if !rule.rules.0.is_empty() {
        return None;
    }
    let key = block_key(&rule.declarations)?;
    let properties = declared_properties(&rule.declarations);

    for (index, candidate) in earlier.iter().enumerate().rev() {
        if let CssRule::Style(candidate) = candidate {
            if candidate.rules.0.is_empty()
                && candidate.vendor_prefix == rule.vendor_prefix
                && block_key(&candidate.declarations).as_deref() == Some(key.as_str())
            {
                return Some(index);
            }
        }
        if touches(candidate, &properties) {
            return None;
        }
    }

    None
}

/// Whether a rule (or anything nested in it) declares one of `properties`.
fn touches<R>(rule: &CssRule<'_, R>, properties: &HashSet<String>) -> bool {
    match rule {
        CssRule::Style(style) => {
            !declared_properties(&style.declarations).is_disjoint(properties)
                || style.rules.0.iter().any(|rule| touches(rule, properties))
        }
        CssRule::Media(media) => media.rules.0.iter().any(|rule| touches(rule, properties)),
        CssRule::Supports(supports) => {
            supports.rules.0.iter().any(|rule| touches(rule, properties))
        }
        CssRule::Keyframes(_)
        | CssRule::FontFace(_)
        | CssRule::Import(_)
        | CssRule::Namespace(_)
        | CssRule::Property(_)
        | CssRule::CounterStyle(_)
        | CssRule::Ignored => false,
        // Unknown contents: never move a rule across it.
        _ => true,
    }
}

fn is_empty_block(block: &DeclarationBlock<'_>) -> bool {
    block.declarations.is_empty() && block.important_declarations.is_empty()
}

/// Printed form of a declaration block, used to compare blocks.
fn block_key(block: &DeclarationBlock<'_>) -> Option<String> {
    block.to_css_string(PrinterOptions::default()).ok()
}

/// Names of every property a block sets, shorthands expanded to their
/// longhands.
fn declared_properties(block: &DeclarationBlock<'_>) -> HashSet<String> {
    let mut names = HashSet::new();
    for property in block.declarations.iter().chain(&block.important_declarations) {
        expand(&property.property_id(), &mut names);
    }
    names
}

fn expand(id: &PropertyId<'_>, names: &mut HashSet<String>) {
    if !names.insert(id.name().to_string()) {
        return;
    }
    if let Some(longhands) = id.longhands() {
        for longhand in &longhands {
            expand(longhand, names);
        }
    }
}
