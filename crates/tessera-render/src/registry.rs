use crate::Result;
use crate::builtins;
use crate::item::Item;
use rustc_hash::FxHashMap;
use std::fmt;
use tessera_core::{Error as CoreError, ItemConfig};

/// Builds an item from its configuration. Option validation happens here.
pub type ItemFactory = fn(config: &ItemConfig) -> Result<Box<dyn Item>>;

/// Which fragment pool an item renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Chart,
    Component,
    Overlay,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Chart => "chart",
            LayerKind::Component => "component",
            LayerKind::Overlay => "overlay",
        }
    }

    /// Charts paint above components; overlays sit outside the svg entirely.
    pub fn default_z_index(self) -> i32 {
        match self {
            LayerKind::Chart => 100,
            LayerKind::Component => 50,
            LayerKind::Overlay => 150,
        }
    }

    pub fn parse(kind: &str, type_name: &str) -> Result<Self> {
        match kind {
            "chart" => Ok(LayerKind::Chart),
            "component" => Ok(LayerKind::Component),
            "overlay" => Ok(LayerKind::Overlay),
            other => Err(CoreError::UnknownLayerKind {
                kind: other.to_string(),
                type_name: type_name.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static metadata and constructor of a chart/component type.
#[derive(Clone)]
pub struct ItemType {
    pub name: String,
    pub layer_kind: LayerKind,
    pub z_index: i32,
    pub factory: ItemFactory,
}

impl fmt::Debug for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemType")
            .field("name", &self.name)
            .field("layer_kind", &self.layer_kind)
            .field("z_index", &self.z_index)
            .finish_non_exhaustive()
    }
}

impl ItemType {
    pub fn new(name: impl Into<String>, layer_kind: LayerKind, factory: ItemFactory) -> Self {
        Self {
            name: name.into(),
            layer_kind,
            z_index: layer_kind.default_z_index(),
            factory,
        }
    }

    /// Declares the layer kind by name, as plugin metadata does.
    pub fn with_layer_kind_str(
        name: impl Into<String>,
        layer_kind: &str,
        factory: ItemFactory,
    ) -> Result<Self> {
        let name = name.into();
        let layer_kind = LayerKind::parse(layer_kind, &name)?;
        Ok(Self::new(name, layer_kind, factory))
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn create(&self, config: &ItemConfig) -> Result<Box<dyn Item>> {
        (self.factory)(config)
    }
}

/// Type name -> [`ItemType`]. Owned by one composition; never global.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, ItemType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_type: ItemType) {
        self.types.insert(item_type.name.clone(), item_type);
    }

    pub fn get(&self, type_name: &str) -> Option<&ItemType> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up the type of `config`, failing on a missing or unregistered type.
    pub fn resolve(&self, config: &ItemConfig) -> Result<&ItemType> {
        let Some(type_name) = config.type_name.as_deref() else {
            return Err(CoreError::MissingType {
                item_id: config.id_str().to_string(),
            }
            .into());
        };
        self.get(type_name).ok_or_else(|| {
            CoreError::UnregisteredType {
                type_name: type_name.to_string(),
            }
            .into()
        })
    }

    /// `Text`, `Title`, `Legend`, `Bars`, `Labels` and `Overlay`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();

        reg.insert(
            ItemType::new("Text", LayerKind::Component, builtins::text::create_text).z_index(70),
        );
        reg.insert(
            ItemType::new("Title", LayerKind::Component, builtins::text::create_title)
                .z_index(70),
        );
        reg.insert(ItemType::new(
            "Legend",
            LayerKind::Component,
            builtins::legend::create_legend,
        ));

        reg.insert(ItemType::new(
            "Bars",
            LayerKind::Chart,
            builtins::bars::create_bars,
        ));
        reg.insert(ItemType::new(
            "Labels",
            LayerKind::Chart,
            builtins::labels::create_labels,
        ));

        reg.insert(ItemType::new(
            "Overlay",
            LayerKind::Overlay,
            builtins::overlay::create_overlay,
        ));

        reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn unknown_layer_kind_is_a_configuration_error() {
        let err = ItemType::with_layer_kind_str("Fancy", "sidebar", builtins::text::create_text)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(CoreError::UnknownLayerKind { ref kind, .. }) if kind == "sidebar"
        ));
    }

    #[test]
    fn resolve_reports_missing_and_unregistered_types() {
        let reg = TypeRegistry::with_builtins();
        let err = reg.resolve(&ItemConfig::default().id("a")).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::MissingType { .. })));

        let err = reg.resolve(&ItemConfig::new("Pie")).unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::UnregisteredType { .. })));

        let bars = reg.resolve(&ItemConfig::new("Bars")).unwrap();
        assert_eq!(bars.layer_kind, LayerKind::Chart);
        assert_eq!(bars.z_index, 100);
    }
}
