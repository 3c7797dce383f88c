use std::sync::Arc;

use thiserror::Error;

use super::active::Active;
use super::backdrop::{Backdrop, BackdropOptions};
use super::collision::{self, CollisionMap, MaskTest};
use super::paragraph::{Paragraph, ParagraphOptions};
use super::Entity;
use crate::content::{ActiveDef, BackdropDef, FontDef};

/// Generational handle. Stale once its entity is destroyed or its room is
/// swapped out, even if the slot gets reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Foreground,
}

impl Layer {
    /// Draw order: background first.
    pub const ALL: [Layer; 2] = [Layer::Background, Layer::Foreground];

    fn index(self) -> usize {
        match self {
            Layer::Background => 0,
            Layer::Foreground => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Active,
    Backdrop,
    Paragraph,
}

#[derive(Debug, Clone)]
pub enum Instance {
    Active(Active),
    Backdrop(Backdrop),
    Paragraph(Paragraph),
}

impl Instance {
    pub fn kind(&self) -> EntityKind {
        match self {
            Instance::Active(_) => EntityKind::Active,
            Instance::Backdrop(_) => EntityKind::Backdrop,
            Instance::Paragraph(_) => EntityKind::Paragraph,
        }
    }

    pub fn as_entity(&self) -> &dyn Entity {
        match self {
            Instance::Active(active) => active,
            Instance::Backdrop(backdrop) => backdrop,
            Instance::Paragraph(paragraph) => paragraph,
        }
    }

    pub fn as_entity_mut(&mut self) -> &mut dyn Entity {
        match self {
            Instance::Active(active) => active,
            Instance::Backdrop(backdrop) => backdrop,
            Instance::Paragraph(paragraph) => paragraph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entity handle {0:?} is stale (destroyed or removed with its room)")]
    StaleHandle(EntityId),
    #[error("entity {id:?} is a {actual:?}, not a {expected:?}")]
    WrongKind {
        id: EntityId,
        expected: EntityKind,
        actual: EntityKind,
    },
    #[error("no {kind:?} definition named `{name}`")]
    UnknownDefinition { kind: EntityKind, name: String },
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

/// Owns every live entity of the current room: one linear list per kind and
/// one draw-order list per layer.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    actives: Vec<EntityId>,
    backdrops: Vec<EntityId>,
    paragraphs: Vec<EntityId>,
    draw_orders: [Vec<EntityId>; 2],
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_active(&mut self, def: Arc<ActiveDef>, layer: Layer, x: f32, y: f32) -> EntityId {
        self.insert(layer, Instance::Active(Active::new(def, layer, x, y)))
    }

    pub fn add_backdrop(
        &mut self,
        def: Arc<BackdropDef>,
        layer: Layer,
        x: f32,
        y: f32,
        options: BackdropOptions,
    ) -> EntityId {
        self.insert(
            layer,
            Instance::Backdrop(Backdrop::new(def, layer, x, y, options)),
        )
    }

    pub fn add_paragraph(
        &mut self,
        font: Arc<FontDef>,
        layer: Layer,
        x: f32,
        y: f32,
        text: &str,
        options: ParagraphOptions,
    ) -> EntityId {
        self.insert(
            layer,
            Instance::Paragraph(Paragraph::new(font, layer, x, y, text, options)),
        )
    }

    fn insert(&mut self, layer: Layer, instance: Instance) -> EntityId {
        let kind = instance.kind();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.instance = Some(instance);
                EntityId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    instance: Some(instance),
                });
                EntityId {
                    index,
                    generation: 0,
                }
            }
        };
        self.kind_list_mut(kind).push(id);
        self.draw_orders[layer.index()].push(id);
        id
    }

    /// Removes one entity from its kind list and its layer. Destroying a
    /// handle twice is reported, never silently repeated.
    pub fn destroy(&mut self, id: EntityId) -> Result<(), RegistryError> {
        let instance = self.get(id).ok_or(RegistryError::StaleHandle(id))?;
        let kind = instance.kind();
        let layer = instance.as_entity().layer();

        let list = self.kind_list_mut(kind);
        if let Some(position) = list.iter().position(|candidate| *candidate == id) {
            list.remove(position);
        }
        let order = &mut self.draw_orders[layer.index()];
        if let Some(position) = order.iter().position(|candidate| *candidate == id) {
            order.remove(position);
        }

        let slot = &mut self.slots[id.index as usize];
        slot.instance = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(())
    }

    /// Drops every entity and invalidates every outstanding handle.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.instance.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.actives.clear();
        self.backdrops.clear();
        self.paragraphs.clear();
        for order in &mut self.draw_orders {
            order.clear();
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.actives.len() + self.backdrops.len() + self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: EntityId) -> Option<&Instance> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    pub fn entity(&self, id: EntityId) -> Result<&dyn Entity, RegistryError> {
        self.get(id)
            .map(Instance::as_entity)
            .ok_or(RegistryError::StaleHandle(id))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut dyn Entity, RegistryError> {
        self.get_mut(id)
            .map(Instance::as_entity_mut)
            .ok_or(RegistryError::StaleHandle(id))
    }

    pub fn active(&self, id: EntityId) -> Result<&Active, RegistryError> {
        match self.get(id) {
            Some(Instance::Active(active)) => Ok(active),
            Some(other) => Err(wrong_kind(id, EntityKind::Active, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn active_mut(&mut self, id: EntityId) -> Result<&mut Active, RegistryError> {
        match self.get_mut(id) {
            Some(Instance::Active(active)) => Ok(active),
            Some(other) => Err(wrong_kind(id, EntityKind::Active, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn backdrop(&self, id: EntityId) -> Result<&Backdrop, RegistryError> {
        match self.get(id) {
            Some(Instance::Backdrop(backdrop)) => Ok(backdrop),
            Some(other) => Err(wrong_kind(id, EntityKind::Backdrop, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn backdrop_mut(&mut self, id: EntityId) -> Result<&mut Backdrop, RegistryError> {
        match self.get_mut(id) {
            Some(Instance::Backdrop(backdrop)) => Ok(backdrop),
            Some(other) => Err(wrong_kind(id, EntityKind::Backdrop, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn paragraph(&self, id: EntityId) -> Result<&Paragraph, RegistryError> {
        match self.get(id) {
            Some(Instance::Paragraph(paragraph)) => Ok(paragraph),
            Some(other) => Err(wrong_kind(id, EntityKind::Paragraph, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn paragraph_mut(&mut self, id: EntityId) -> Result<&mut Paragraph, RegistryError> {
        match self.get_mut(id) {
            Some(Instance::Paragraph(paragraph)) => Ok(paragraph),
            Some(other) => Err(wrong_kind(id, EntityKind::Paragraph, other)),
            None => Err(RegistryError::StaleHandle(id)),
        }
    }

    pub fn actives(&self) -> &[EntityId] {
        &self.actives
    }

    pub fn backdrops(&self) -> &[EntityId] {
        &self.backdrops
    }

    pub fn paragraphs(&self) -> &[EntityId] {
        &self.paragraphs
    }

    pub fn draw_order(&self, layer: Layer) -> &[EntityId] {
        &self.draw_orders[layer.index()]
    }

    /// Swaps with the next entity in the layer; no-op at the front.
    pub fn bring_forward(&mut self, id: EntityId) -> Result<(), RegistryError> {
        let (order, position) = self.order_position(id)?;
        if position + 1 < order.len() {
            order.swap(position, position + 1);
        }
        Ok(())
    }

    pub fn send_backward(&mut self, id: EntityId) -> Result<(), RegistryError> {
        let (order, position) = self.order_position(id)?;
        if position > 0 {
            order.swap(position, position - 1);
        }
        Ok(())
    }

    pub fn bring_to_front(&mut self, id: EntityId) -> Result<(), RegistryError> {
        let (order, position) = self.order_position(id)?;
        let moved = order.remove(position);
        order.push(moved);
        Ok(())
    }

    pub fn send_to_back(&mut self, id: EntityId) -> Result<(), RegistryError> {
        let (order, position) = self.order_position(id)?;
        let moved = order.remove(position);
        order.insert(0, moved);
        Ok(())
    }

    fn order_position(&mut self, id: EntityId) -> Result<(&mut Vec<EntityId>, usize), RegistryError> {
        let layer = self.entity(id)?.layer();
        let order = &mut self.draw_orders[layer.index()];
        let position = order
            .iter()
            .position(|candidate| *candidate == id)
            .ok_or(RegistryError::StaleHandle(id))?;
        Ok((order, position))
    }

    /// Pairwise shape test between two actives; marks both on a hit.
    pub fn test_collision(&mut self, a: EntityId, b: EntityId) -> Result<bool, RegistryError> {
        let mut first = *self.active(a)?.collider();
        let mut second = *self.active(b)?.collider();
        let hit = collision::test_shapes(&mut first, &mut second);
        if hit {
            self.active_mut(a)?.collider_mut().mark_collided();
            self.active_mut(b)?.collider_mut().mark_collided();
        }
        Ok(hit)
    }

    pub fn hover_test(&mut self, id: EntityId, x: f32, y: f32) -> Result<bool, RegistryError> {
        let collider = self.active_mut(id)?.collider_mut();
        Ok(collision::hover_test(collider, x, y))
    }

    pub fn test_against_masks(
        &mut self,
        id: EntityId,
        map: Option<&CollisionMap>,
        category: &str,
    ) -> Result<MaskTest, RegistryError> {
        let collider = self.active_mut(id)?.collider_mut();
        Ok(collision::test_against_masks(collider, map, category))
    }

    pub(crate) fn reset_collision_flags(&mut self) {
        for slot in &mut self.slots {
            if let Some(Instance::Active(active)) = slot.instance.as_mut() {
                active.collider_mut().reset_flags();
            }
        }
    }

    pub(crate) fn advance_animations(&mut self) {
        for id in &self.actives {
            if let Some(Slot {
                instance: Some(Instance::Active(active)),
                ..
            }) = self.slots.get_mut(id.index as usize)
            {
                active.advance_animation();
            }
        }
    }

    fn kind_list_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityId> {
        match kind {
            EntityKind::Active => &mut self.actives,
            EntityKind::Backdrop => &mut self.backdrops,
            EntityKind::Paragraph => &mut self.paragraphs,
        }
    }
}

fn wrong_kind(id: EntityId, expected: EntityKind, actual: &Instance) -> RegistryError {
    RegistryError::WrongKind {
        id,
        expected,
        actual: actual.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ColliderDef, ImageData};

    fn active_def(name: &str) -> Arc<ActiveDef> {
        Arc::new(ActiveDef::new(name).with_collider(ColliderDef::rectangle(0.0, 0.0, 10.0, 10.0)))
    }

    fn backdrop_def() -> Arc<BackdropDef> {
        Arc::new(BackdropDef {
            name: "sky".to_string(),
            image: ImageData::solid(4, 4, [0; 4]),
            mosaic: false,
        })
    }

    #[test]
    fn entities_land_in_kind_and_layer_lists() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        let sky = registry.add_backdrop(
            backdrop_def(),
            Layer::Background,
            0.0,
            0.0,
            BackdropOptions::default(),
        );
        assert_eq!(registry.actives(), [a]);
        assert_eq!(registry.backdrops(), [sky]);
        assert_eq!(registry.draw_order(Layer::Foreground), [a]);
        assert_eq!(registry.draw_order(Layer::Background), [sky]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn destroy_splices_and_second_destroy_is_stale() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        let b = registry.add_active(active_def("b"), Layer::Foreground, 0.0, 0.0);
        let c = registry.add_active(active_def("c"), Layer::Foreground, 0.0, 0.0);

        registry.destroy(b).expect("destroy");
        assert_eq!(registry.actives(), [a, c]);
        assert_eq!(registry.draw_order(Layer::Foreground), [a, c]);

        assert_eq!(registry.destroy(b), Err(RegistryError::StaleHandle(b)));
        assert_eq!(registry.actives(), [a, c]);
        assert!(registry.contains(a) && registry.contains(c));
    }

    #[test]
    fn reused_slot_does_not_revive_stale_handle() {
        let mut registry = InstanceRegistry::new();
        let old = registry.add_active(active_def("old"), Layer::Foreground, 0.0, 0.0);
        registry.destroy(old).expect("destroy");
        let new = registry.add_active(active_def("new"), Layer::Foreground, 0.0, 0.0);
        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert_eq!(registry.active(new).expect("new").name(), "new");
    }

    #[test]
    fn clear_invalidates_every_handle() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.draw_order(Layer::Foreground).is_empty());
        assert_eq!(registry.destroy(a), Err(RegistryError::StaleHandle(a)));
        let b = registry.add_active(active_def("b"), Layer::Foreground, 0.0, 0.0);
        assert!(registry.get(a).is_none());
        assert!(registry.contains(b));
    }

    #[test]
    fn reorder_operations_move_within_layer() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        let b = registry.add_active(active_def("b"), Layer::Foreground, 0.0, 0.0);
        let c = registry.add_active(active_def("c"), Layer::Foreground, 0.0, 0.0);

        registry.bring_forward(a).expect("forward");
        assert_eq!(registry.draw_order(Layer::Foreground), [b, a, c]);
        registry.send_backward(c).expect("backward");
        assert_eq!(registry.draw_order(Layer::Foreground), [b, c, a]);
        registry.send_to_back(a).expect("back");
        assert_eq!(registry.draw_order(Layer::Foreground), [a, b, c]);
        registry.bring_to_front(a).expect("front");
        assert_eq!(registry.draw_order(Layer::Foreground), [b, c, a]);

        registry.bring_forward(a).expect("already front");
        registry.send_backward(b).expect("already back");
        assert_eq!(registry.draw_order(Layer::Foreground), [b, c, a]);
        assert_eq!(registry.actives(), [a, b, c]);
    }

    #[test]
    fn typed_access_reports_wrong_kind() {
        let mut registry = InstanceRegistry::new();
        let sky = registry.add_backdrop(
            backdrop_def(),
            Layer::Background,
            0.0,
            0.0,
            BackdropOptions::default(),
        );
        assert_eq!(
            registry.active(sky).map(|_| ()),
            Err(RegistryError::WrongKind {
                id: sky,
                expected: EntityKind::Active,
                actual: EntityKind::Backdrop,
            })
        );
        assert!(registry.backdrop(sky).is_ok());
    }

    #[test]
    fn collision_marks_both_and_flags_reset() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        let b = registry.add_active(active_def("b"), Layer::Foreground, 5.0, 5.0);
        let far = registry.add_active(active_def("far"), Layer::Foreground, 50.0, 50.0);

        assert!(registry.test_collision(a, b).expect("test"));
        assert!(!registry.test_collision(a, far).expect("test"));
        assert!(registry.active(a).expect("a").is_colliding());
        assert!(registry.active(b).expect("b").is_colliding());
        assert!(!registry.active(far).expect("far").is_colliding());

        registry.reset_collision_flags();
        assert!(!registry.active(a).expect("a").is_colliding());
    }

    #[test]
    fn entity_accessors_toggle_visibility_and_opacity() {
        let mut registry = InstanceRegistry::new();
        let a = registry.add_active(active_def("a"), Layer::Foreground, 0.0, 0.0);
        let entity = registry.entity_mut(a).expect("entity");
        entity.set_visible(false);
        entity.set_opacity(2.0);
        let entity = registry.entity(a).expect("entity");
        assert!(!entity.is_visible());
        assert_eq!(entity.opacity(), 1.0);
    }
}
