//! Item Registry: live chart/component instances keyed by id.
//!
//! Reconciliation runs in two phases. [`ItemPool::plan`] resolves types, constructs new
//! instances and validates options of kept ones without touching the surface, so a
//! configuration error leaves both the pool and the surface untouched.
//! [`ItemPool::prepare`] then creates fragments and reconfigures kept items, the two steps
//! that can still fail; on failure it removes the fragments it created and leaves every slot
//! in place. [`ItemPool::commit`] cannot fail: it detaches, recreates and attaches.

use crate::item::Item;
use crate::registry::{ItemType, LayerKind, TypeRegistry};
use crate::surface::{NodeId, Surface};
use crate::{Error, Result};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::fmt;
use tessera_core::{DataFn, Error as CoreError, ItemConfig, ItemData, Position};

/// Attach/detach notifications, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Attached {
        id: String,
        instance: u64,
        kind: LayerKind,
    },
    Detached {
        id: String,
        instance: u64,
    },
}

/// One live item and its fragment.
pub struct ItemSlot {
    pub id: String,
    pub type_name: String,
    pub kind: LayerKind,
    pub z_index: i32,
    pub layer: NodeId,
    /// Unique per construction; unchanged while the item is updated in place.
    pub instance: u64,
    pub position: Option<Position>,
    pub derive: Option<DataFn>,
    pub item: Box<dyn Item>,
}

impl fmt::Debug for ItemSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemSlot")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("z_index", &self.z_index)
            .field("layer", &self.layer)
            .field("instance", &self.instance)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl ItemSlot {
    /// Applies the item's data derivation, if any.
    pub fn derived_data(&self, original: &Value) -> Option<Value> {
        self.derive.as_ref().map(|f| f(original))
    }
}

enum Step {
    Keep {
        index: usize,
        config: ItemConfig,
    },
    Create {
        config: ItemConfig,
        item_type: ItemType,
        item: Box<dyn Item>,
        replaces: Option<usize>,
    },
}

/// Validated reconciliation, ready to apply to the pool it was planned against.
pub struct ReconcilePlan {
    steps: Vec<Step>,
    removed: Vec<usize>,
    /// Fragments created by [`ItemPool::prepare`], one per `Create` step.
    layers: Vec<NodeId>,
}

impl ReconcilePlan {
    pub fn created(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Create { .. }))
            .count()
    }

    pub fn removed(&self) -> usize {
        self.removed.len()
    }

    /// Removes the fragments of a prepared plan that will not be committed.
    pub fn discard(self, surface: &mut dyn Surface) {
        discard_layers(self.layers, surface);
    }
}

#[derive(Debug, Default)]
pub struct ItemPool {
    slots: Vec<ItemSlot>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[ItemSlot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [ItemSlot] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&ItemSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ItemSlot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Decides, for every config, whether its item is kept, created or recreated.
    pub fn plan(
        &self,
        configs: &[ItemConfig],
        types: &TypeRegistry,
        surface: &dyn Surface,
    ) -> Result<ReconcilePlan> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut steps = Vec::with_capacity(configs.len());

        for config in configs {
            let id = config.id_str();
            if !seen.insert(id) {
                return Err(CoreError::malformed(format!("duplicate item id \"{id}\"")).into());
            }

            let item_type = types.resolve(config)?;
            if !surface.supports(item_type.layer_kind) {
                return Err(Error::surface(format!(
                    "cannot create {} layer for \"{id}\" ({})",
                    item_type.layer_kind, item_type.name
                )));
            }

            let existing = self.index_of(id);
            let replaces = existing.filter(|&index| {
                let slot = &self.slots[index];
                let changed_type = slot.type_name != item_type.name;
                let changed_position = slot.kind != LayerKind::Overlay
                    && matches!(
                        (slot.position, config.position),
                        (Some(old), Some(new)) if old != new
                    );
                if changed_type || changed_position {
                    tracing::debug!(
                        id,
                        changed_type,
                        changed_position,
                        "item will be recreated"
                    );
                }
                changed_type || changed_position
            });

            match (existing, replaces) {
                (Some(index), None) => {
                    // Trial construction validates the new options without touching the live item.
                    item_type.create(config)?.configure(config)?;
                    steps.push(Step::Keep {
                        index,
                        config: config.clone(),
                    });
                }
                _ => {
                    let mut item = item_type.create(config)?;
                    item.configure(config)?;
                    steps.push(Step::Create {
                        config: config.clone(),
                        item_type: item_type.clone(),
                        item,
                        replaces,
                    });
                }
            }
        }

        let removed = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !seen.contains(s.id.as_str()))
            .map(|(index, _)| index)
            .collect();

        Ok(ReconcilePlan {
            steps,
            removed,
            layers: Vec::new(),
        })
    }

    /// Creates the fragments of new items and reconfigures kept ones.
    pub fn prepare(&mut self, plan: &mut ReconcilePlan, surface: &mut dyn Surface) -> Result<()> {
        let mut layers = Vec::with_capacity(plan.created());
        for step in &plan.steps {
            let Step::Create { item_type, .. } = step else {
                continue;
            };
            match surface.append_fragment(item_type.layer_kind, item_type.z_index) {
                Ok(layer) => layers.push(layer),
                Err(err) => {
                    discard_layers(layers, surface);
                    return Err(err);
                }
            }
        }

        for step in &plan.steps {
            let Step::Keep { index, config } = step else {
                continue;
            };
            let Some(slot) = self.slots.get_mut(*index) else {
                continue;
            };
            if let Err(err) = slot.item.configure(config) {
                tracing::warn!(id = %slot.id, error = %err, "reconfigure failed");
                discard_layers(layers, surface);
                return Err(err);
            }
        }

        plan.layers = layers;
        Ok(())
    }

    /// Detaches removed and replaced items and attaches new ones on their prepared fragments.
    pub fn commit(
        &mut self,
        plan: ReconcilePlan,
        surface: &mut dyn Surface,
        next_instance: &mut u64,
        events: &mut Vec<LifecycleEvent>,
    ) {
        let mut old: Vec<Option<ItemSlot>> = std::mem::take(&mut self.slots)
            .into_iter()
            .map(Some)
            .collect();

        for index in plan.removed {
            if let Some(slot) = old.get_mut(index).and_then(Option::take) {
                detach(slot, surface, events);
            }
        }

        let mut layers = plan.layers.into_iter();
        let mut slots = Vec::with_capacity(plan.steps.len());
        for step in plan.steps {
            match step {
                Step::Keep { index, config } => {
                    let Some(mut slot) = old.get_mut(index).and_then(Option::take) else {
                        continue;
                    };
                    slot.position = config.position;
                    slot.derive = derive_fn(&config);
                    slots.push(slot);
                }
                Step::Create {
                    config,
                    item_type,
                    item,
                    replaces,
                } => {
                    if let Some(slot) = replaces.and_then(|i| old.get_mut(i)).and_then(Option::take)
                    {
                        detach(slot, surface, events);
                    }
                    let Some(layer) = layers.next() else {
                        continue;
                    };
                    *next_instance += 1;
                    let slot = ItemSlot {
                        id: config.id_str().to_string(),
                        type_name: item_type.name.clone(),
                        kind: item_type.layer_kind,
                        z_index: item_type.z_index,
                        layer,
                        instance: *next_instance,
                        position: config.position,
                        derive: derive_fn(&config),
                        item,
                    };
                    slots.push(attach(slot, surface, events));
                }
            }
        }

        self.slots = slots;
    }

    /// Detaches every item.
    pub fn clear(&mut self, surface: &mut dyn Surface, events: &mut Vec<LifecycleEvent>) {
        for slot in std::mem::take(&mut self.slots) {
            detach(slot, surface, events);
        }
    }
}

fn discard_layers(layers: Vec<NodeId>, surface: &mut dyn Surface) {
    for layer in layers {
        surface.remove(layer);
    }
}

fn derive_fn(config: &ItemConfig) -> Option<DataFn> {
    match &config.data {
        Some(ItemData::Derived(f)) => Some(f.clone()),
        _ => None,
    }
}

fn attach(
    mut slot: ItemSlot,
    surface: &mut dyn Surface,
    events: &mut Vec<LifecycleEvent>,
) -> ItemSlot {
    surface.set_attr(slot.layer, "data-id", &slot.id);
    slot.item.on_attach(&slot.id);
    tracing::debug!(id = %slot.id, type_name = %slot.type_name, kind = %slot.kind, "attach");
    events.push(LifecycleEvent::Attached {
        id: slot.id.clone(),
        instance: slot.instance,
        kind: slot.kind,
    });
    slot
}

fn detach(mut slot: ItemSlot, surface: &mut dyn Surface, events: &mut Vec<LifecycleEvent>) {
    surface.remove(slot.layer);
    slot.item.on_detach();
    tracing::debug!(id = %slot.id, type_name = %slot.type_name, "detach");
    events.push(LifecycleEvent::Detached {
        id: slot.id,
        instance: slot.instance,
    });
}
