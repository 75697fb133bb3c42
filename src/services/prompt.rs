//! Prompt construction for the item-specifics generator.

/// Label used when the detector returned fewer than five labels.
pub const FALLBACK_ITEM_LABEL: &str = "clothing";

/// Position of the label that names the item type.
const ITEM_LABEL_INDEX: usize = 4;

/// Output fields the generator must fill, with guidance for each.
pub const ITEM_FIELDS: [(&str, &str); 6] = [
    (
        "color",
        "Describe the main color(s) of the item. If unclear, make a reasonable guess based on similar items",
    ),
    (
        "collar_type",
        "Describe the collar style (e.g., crew neck, v-neck, polo, etc.). If not visible, use 'unknown'",
    ),
    (
        "sleeve_type",
        "Describe the sleeve style (e.g., short sleeve, long sleeve, etc.)",
    ),
    (
        "fit",
        "Describe how the item appears to fit (e.g., regular, loose, fitted)",
    ),
    ("style", "Specify if the item is blank, graphic, or embellished"),
    ("pattern", "Describe any visible pattern or state 'solid' if none"),
];

/// The label naming the item, or [`FALLBACK_ITEM_LABEL`] for short label sets.
pub fn item_label(labels: &[String]) -> &str {
    labels
        .get(ITEM_LABEL_INDEX)
        .map(String::as_str)
        .unwrap_or(FALLBACK_ITEM_LABEL)
}

/// Build the generation prompt for a label set. Deterministic: only the
/// embedded labels vary between calls.
pub fn build_prompt(labels: &[String]) -> String {
    let schema = ITEM_FIELDS
        .iter()
        .map(|(name, guidance)| format!("  \"{}\": \"{}\"", name, guidance))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Based on these Vision AI labels for a clothing item: {labels:?}\n\
         \n\
         Generate a detailed JSON object describing the item. For each field, make an educated \
         guess based on the labels and common clothing characteristics.\n\
         \n\
         Required fields:\n\
         {{\n{schema}\n}}\n\
         \n\
         The labels indicate this is an '{item}' item.\n\
         Analyze these labels and provide specific, confident descriptions even if some details \
         are implied rather than explicitly stated.\n\
         \n\
         Respond ONLY with the JSON object, no additional text.\n",
        labels = labels,
        schema = schema,
        item = item_label(labels),
    )
}
