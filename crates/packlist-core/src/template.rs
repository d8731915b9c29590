use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::item::{Item, ORDER_STRIDE, icon_or_placeholder};
use crate::reducer::Environment;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateItem {
    pub label: String,
    pub icon: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub items: Vec<TemplateItem>,
}

impl Template {
    pub fn new(id: &str, name: &str, description: &str, items: &[(&str, &str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            items: items
                .iter()
                .map(|(label, icon, category)| TemplateItem {
                    label: label.to_string(),
                    icon: icon.to_string(),
                    category: Some(category.to_string()),
                })
                .collect(),
        }
    }
}

/// Read-only, ordered set of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Template::new(
                "daytrip",
                "日帰りおでかけ",
                "近場へのおでかけに最低限の持ち物",
                &[
                    ("財布", "👛", "valuables"),
                    ("スマホ", "📱", "valuables"),
                    ("鍵", "🔑", "valuables"),
                    ("ハンカチ", "🧺", "daily"),
                    ("ティッシュ", "🧻", "daily"),
                    ("モバイルバッテリー", "🔋", "gadgets"),
                ],
            ),
            Template::new(
                "overnight",
                "1泊2日の旅行",
                "着替えと洗面用具を含む小旅行セット",
                &[
                    ("財布", "👛", "valuables"),
                    ("スマホ", "📱", "valuables"),
                    ("充電器", "🔌", "gadgets"),
                    ("着替え", "👕", "clothes"),
                    ("下着", "🩲", "clothes"),
                    ("歯ブラシ", "🪥", "toiletries"),
                    ("常備薬", "💊", "health"),
                    ("保険証", "🪪", "valuables"),
                ],
            ),
            Template::new(
                "business",
                "出張",
                "仕事道具と身だしなみ",
                &[
                    ("ノートPC", "💻", "gadgets"),
                    ("PC充電器", "🔌", "gadgets"),
                    ("名刺", "📇", "work"),
                    ("資料", "📄", "work"),
                    ("ワイシャツ", "👔", "clothes"),
                    ("財布", "👛", "valuables"),
                    ("スマホ", "📱", "valuables"),
                ],
            ),
            Template::new(
                "beach",
                "海水浴",
                "日差しと水辺の対策",
                &[
                    ("水着", "🩱", "clothes"),
                    ("タオル", "🏖", "daily"),
                    ("日焼け止め", "🧴", "health"),
                    ("サングラス", "🕶", "daily"),
                    ("ビーチサンダル", "🩴", "clothes"),
                    ("飲み物", "🥤", "food"),
                ],
            ),
        ])
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }
}

/// Label key used for duplicate detection; Unicode case folding so `Pc` and `PC` collide.
fn label_key(label: &str) -> String {
    label.to_lowercase()
}

/// Builds fresh items from a template: trims labels, drops blanks, keeps the
/// first of any case-insensitive duplicate, and numbers survivors 10, 20, ...
pub fn expand_template<E: Environment + ?Sized>(template: &Template, env: &mut E) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(template.items.len());

    for entry in &template.items {
        let label = entry.label.trim();
        if label.is_empty() {
            continue;
        }
        if !seen.insert(label_key(label)) {
            trace!(label, template = %template.id, "dropping duplicate template entry");
            continue;
        }
        let order = (items.len() as i64 + 1) * ORDER_STRIDE;
        items.push(Item {
            id: env.fresh_id(),
            label: label.to_string(),
            icon: icon_or_placeholder(&entry.icon),
            done: false,
            order,
            category: entry.category.clone(),
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::FixedEnvironment;

    #[test]
    fn expansion_trims_dedupes_and_numbers() {
        let template = Template::new(
            "t",
            "T",
            "",
            &[
                (" Passport ", "🛂", "docs"),
                ("", "x", "junk"),
                ("passport", "📕", "other"),
                ("Charger", "", "gadgets"),
            ],
        );
        let mut env = FixedEnvironment::new(0);
        let items = expand_template(&template, &mut env);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Passport");
        assert_eq!(items[0].icon, "🛂");
        assert_eq!(items[0].category.as_deref(), Some("docs"));
        assert_eq!(items[1].icon, crate::item::PLACEHOLDER_ICON);
        assert_eq!(
            items.iter().map(|i| i.order).collect::<Vec<_>>(),
            vec![10, 20]
        );
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn builtin_catalog_lookup() {
        let catalog = TemplateCatalog::builtin();
        assert!(catalog.get("overnight").is_some());
        assert!(catalog.get("missing").is_none());
        assert!(catalog.all().len() >= 4);
    }
}
