//! Object registry - the single owner of every live game object.
//!
//! Objects are `hecs` entities. A separate insertion-ordered list keeps
//! creation order (which is also level-file order) for iteration and saving.
//!
//! Destruction is deferred: [`ObjectRegistry::destroy`] attaches a
//! [`Tombstone`] and every query skips tombstoned entities until
//! [`ObjectRegistry::sweep`] removes them between frames. This lets a
//! per-frame pass destroy objects without invalidating its own iteration.

use hecs::{Component, Entity, EntityBuilder, World};
use thiserror::Error;

use botfield_logic::object_type::{Capability, CapabilitySet, ObjectType};

use crate::components::*;
use crate::math::Vec3;

#[derive(Error, Debug)]
pub enum CreateError {
    #[error("object type {0:?} cannot be instantiated")]
    NotInstantiable(ObjectType),
    #[error("object id {0} is already in use")]
    DuplicateId(i32),
}

/// Everything needed to instantiate one object
#[derive(Debug, Clone, PartialEq)]
pub struct CreateParams {
    pub object_type: ObjectType,
    pub position: Vec3,
    /// Rotation around the vertical axis, radians
    pub angle: f32,
    /// Energy of the power cell created for powered vehicles, 0 = no cell
    pub power: f32,
    pub zoom: f32,
    /// Initial height above the ground
    pub height: f32,
    pub trainer: bool,
    pub toy: bool,
    pub option: i32,
    pub team: i32,
    /// Explicit id (restore), otherwise the next free id
    pub id: Option<i32>,
}

impl CreateParams {
    pub fn new(object_type: ObjectType, position: Vec3) -> Self {
        Self {
            object_type,
            position,
            angle: 0.0,
            power: 0.0,
            zoom: 1.0,
            height: 0.0,
            trainer: false,
            toy: false,
            option: 0,
            team: 0,
            id: None,
        }
    }

    pub fn with_team(mut self, team: i32) -> Self {
        self.team = team;
        self
    }

    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }
}

/// Authoritative collection of game objects
pub struct ObjectRegistry {
    world: World,
    order: Vec<Entity>,
    next_id: i32,
    update_seq: u64,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            order: Vec::new(),
            next_id: 1,
            update_seq: 0,
        }
    }

    // ========================================================================
    // CREATION / DESTRUCTION
    // ========================================================================

    pub fn create(&mut self, params: CreateParams) -> Result<Entity, CreateError> {
        let ty = params.object_type;
        if ty == ObjectType::Null {
            return Err(CreateError::NotInstantiable(ty));
        }
        let id = match params.id {
            Some(id) => {
                if self.find_by_id(id).is_some() {
                    return Err(CreateError::DuplicateId(id));
                }
                id
            }
            None => self.next_id,
        };
        self.next_id = self.next_id.max(id.saturating_add(1));

        let caps = ty.capabilities();
        let mut position = params.position;
        position.y += params.height;

        let flags = ObjectFlags {
            trainer: params.trainer,
            toy: params.toy,
            ..Default::default()
        };
        let attributes = ObjectAttributes {
            option: params.option,
            ..Default::default()
        };

        let mut builder = EntityBuilder::new();
        builder
            .add(ObjectId(id))
            .add(Kind(ty))
            .add(Transform::new(position, params.angle, params.zoom))
            .add(Team(params.team))
            .add(Capabilities(caps))
            .add(flags)
            .add(attributes)
            .add(CameraPrefs::default());
        if caps.has(Capability::Programmable) {
            builder.add(Brain::default());
        }
        if caps.has(Capability::Automated) {
            builder.add(Automat::default());
        }
        let entity = self.world.spawn(builder.build());
        self.order.push(entity);

        if caps.has(Capability::Powered) && ty.is_mobile() && params.power > 0.0 {
            let cell_type = if params.power > 1.0 { ObjectType::Atomic } else { ObjectType::Power };
            let cell = self.create(CreateParams::new(cell_type, position).with_team(params.team))?;
            if let Ok(mut attrs) = self.world.get::<&mut ObjectAttributes>(cell) {
                attrs.energy = if params.power > 1.0 { params.power - 1.0 } else { params.power };
            }
            self.attach_power(entity, cell);
        }

        log::trace!("Created {:?} id={} team={}", ty, id, params.team);
        Ok(entity)
    }

    /// Marks `entity` for removal. Carried objects go with it.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        if let Some(carrier) = self.transporter_of(entity) {
            self.detach(carrier, entity);
        }
        let carried: Vec<Entity> = [self.cargo_of(entity), self.power_of(entity)]
            .into_iter()
            .flatten()
            .collect();

        if let Ok(mut flags) = self.world.get::<&mut ObjectFlags>(entity) {
            flags.selected = false;
            flags.highlighted = false;
        }
        // Entity exists, checked by is_alive
        let _ = self.world.insert_one(entity, Tombstone);

        for c in carried {
            let _ = self.world.remove_one::<Transporter>(c);
            self.destroy(c);
        }
        true
    }

    /// Removes tombstoned entities. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let dead: Vec<Entity> = self
            .order
            .iter()
            .copied()
            .filter(|e| self.world.get::<&Tombstone>(*e).is_ok())
            .collect();
        for e in &dead {
            let _ = self.world.despawn(*e);
        }
        let world = &self.world;
        self.order.retain(|e| world.contains(*e));
        dead.len()
    }

    /// Removes every object immediately
    pub fn clear(&mut self) {
        self.world.clear();
        self.order.clear();
        self.next_id = 1;
    }

    // ========================================================================
    // COMPONENT ACCESS
    // ========================================================================

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.world.get::<&T>(entity).ok()
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, T>> {
        self.world.get::<&mut T>(entity).ok()
    }

    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        self.world.insert_one(entity, component).is_ok()
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.remove_one::<T>(entity).ok()
    }

    pub fn object_type(&self, entity: Entity) -> Option<ObjectType> {
        self.get::<Kind>(entity).map(|k| k.0)
    }

    pub fn id(&self, entity: Entity) -> Option<i32> {
        self.get::<ObjectId>(entity).map(|i| i.0)
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<Transform>(entity).map(|t| *t)
    }

    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.get::<Transform>(entity).map(|t| t.position)
    }

    pub fn set_position(&mut self, entity: Entity, position: Vec3) {
        if let Some(mut t) = self.get_mut::<Transform>(entity) {
            t.position = position;
        }
    }

    pub fn team(&self, entity: Entity) -> i32 {
        self.get::<Team>(entity).map(|t| t.0).unwrap_or(0)
    }

    pub fn capabilities(&self, entity: Entity) -> CapabilitySet {
        self.get::<Capabilities>(entity).map(|c| c.0).unwrap_or_default()
    }

    pub fn implements(&self, entity: Entity, cap: Capability) -> bool {
        self.capabilities(entity).has(cap)
    }

    pub fn flags(&self, entity: Entity) -> ObjectFlags {
        self.get::<ObjectFlags>(entity).map(|f| *f).unwrap_or_default()
    }

    pub fn flags_mut(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, ObjectFlags>> {
        self.get_mut::<ObjectFlags>(entity)
    }

    pub fn attributes(&self, entity: Entity) -> ObjectAttributes {
        self.get::<ObjectAttributes>(entity)
            .map(|a| (*a).clone())
            .unwrap_or_default()
    }

    pub fn attributes_mut(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, ObjectAttributes>> {
        self.get_mut::<ObjectAttributes>(entity)
    }

    pub fn camera_prefs(&self, entity: Entity) -> CameraPrefs {
        self.get::<CameraPrefs>(entity).map(|c| *c).unwrap_or_default()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.world.contains(entity) && self.world.get::<&Tombstone>(entity).is_err()
    }

    /// Live objects in creation order
    pub fn all(&self) -> Vec<Entity> {
        self.order.iter().copied().filter(|e| self.is_alive(*e)).collect()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.order.iter().filter(|e| self.is_alive(**e)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_id(&self, id: i32) -> Option<Entity> {
        self.order
            .iter()
            .copied()
            .find(|e| self.is_alive(*e) && self.id(*e) == Some(id))
    }

    pub fn by_type(&self, ty: ObjectType) -> Vec<Entity> {
        self.order
            .iter()
            .copied()
            .filter(|e| self.is_alive(*e) && self.object_type(*e) == Some(ty))
            .collect()
    }

    pub fn first_of_type(&self, ty: ObjectType) -> Option<Entity> {
        self.order
            .iter()
            .copied()
            .find(|e| self.is_alive(*e) && self.object_type(*e) == Some(ty))
    }

    /// Closest active object of `ty` to `from`, or the first one when no
    /// reference point is given
    pub fn find_nearest(&self, from: Option<Vec3>, ty: ObjectType) -> Option<Entity> {
        let candidates = self
            .by_type(ty)
            .into_iter()
            .filter(|e| self.flags(*e).active);
        match from {
            None => candidates.into_iter().next(),
            Some(p) => candidates
                .filter_map(|e| self.position(e).map(|pos| (e, pos.distance_squared(&p))))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(e, _)| e),
        }
    }

    pub fn count_implementing(&self, cap: Capability) -> usize {
        self.all().into_iter().filter(|e| self.implements(*e, cap)).count()
    }

    /// Whether any active, non-dead object belongs to `team`
    pub fn team_exists(&self, team: i32) -> bool {
        self.all().into_iter().any(|e| {
            let flags = self.flags(e);
            flags.active && !flags.dead && self.team(e) == team
        })
    }

    /// Destroys every object of `team`. Returns how many were destroyed.
    pub fn destroy_team(&mut self, team: i32) -> usize {
        let members: Vec<Entity> = self.all().into_iter().filter(|e| self.team(*e) == team).collect();
        members.into_iter().filter(|e| self.destroy(*e)).count()
    }

    /// Currently selected object
    pub fn selected(&self) -> Option<Entity> {
        self.all().into_iter().find(|e| self.flags(*e).selected)
    }

    // ========================================================================
    // CARRY LINKS
    // ========================================================================

    pub fn transporter_of(&self, entity: Entity) -> Option<Entity> {
        self.get::<Transporter>(entity).map(|t| t.0)
    }

    pub fn is_transported(&self, entity: Entity) -> bool {
        self.transporter_of(entity).is_some()
    }

    pub fn cargo_of(&self, entity: Entity) -> Option<Entity> {
        self.get::<Cargo>(entity).map(|c| c.0)
    }

    pub fn power_of(&self, entity: Entity) -> Option<Entity> {
        self.get::<PowerSlot>(entity).map(|p| p.0)
    }

    /// Puts `cargo` into `carrier`'s hold. Both must have the right
    /// capabilities and the hold must be empty.
    pub fn attach_cargo(&mut self, carrier: Entity, cargo: Entity) -> bool {
        if !self.implements(carrier, Capability::Carrier)
            || !self.implements(cargo, Capability::Transportable)
            || self.cargo_of(carrier).is_some()
            || self.is_transported(cargo)
        {
            return false;
        }
        self.insert(carrier, Cargo(cargo)) && self.insert(cargo, Transporter(carrier))
    }

    /// Puts power cell `cell` into `powered`'s slot
    pub fn attach_power(&mut self, powered: Entity, cell: Entity) -> bool {
        if !self.implements(powered, Capability::Powered)
            || !self.object_type(cell).is_some_and(|t| t.is_power_cell())
            || self.power_of(powered).is_some()
            || self.is_transported(cell)
        {
            return false;
        }
        self.insert(powered, PowerSlot(cell)) && self.insert(cell, Transporter(powered))
    }

    fn detach(&mut self, carrier: Entity, carried: Entity) {
        if self.cargo_of(carrier) == Some(carried) {
            let _ = self.world.remove_one::<Cargo>(carrier);
        }
        if self.power_of(carrier) == Some(carried) {
            let _ = self.world.remove_one::<PowerSlot>(carrier);
        }
        let _ = self.world.remove_one::<Transporter>(carried);
    }

    // ========================================================================
    // PER-FRAME UPDATE
    // ========================================================================

    /// Per-frame update of one interactive object: advances its program and
    /// automaton and stamps the update sequence number
    pub fn update_object(&mut self, entity: Entity, rel_time: f32) {
        if !self.is_alive(entity) || !self.implements(entity, Capability::Interactive) {
            return;
        }
        self.update_seq += 1;
        let seq = self.update_seq;
        if let Some(mut attrs) = self.get_mut::<ObjectAttributes>(entity) {
            attrs.update_seq = seq;
        }
        if let Some(mut brain) = self.get_mut::<Brain>(entity) {
            brain.step();
        }
        if let Some(mut automat) = self.get_mut::<Automat>(entity) {
            automat.update(rel_time);
        }
        // A carried object follows its carrier
        if let Some(carrier) = self.transporter_of(entity) {
            if let Some(pos) = self.position(carrier) {
                self.set_position(entity, pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    #[test]
    fn test_create_assigns_ids_and_capabilities() {
        let mut reg = ObjectRegistry::new();
        let a = reg.create(CreateParams::new(ObjectType::Human, at(0.0, 0.0))).unwrap();
        let b = reg.create(CreateParams::new(ObjectType::MobileWa, at(1.0, 0.0))).unwrap();
        assert_eq!(reg.id(a), Some(1));
        assert_eq!(reg.id(b), Some(2));
        assert!(reg.get::<Brain>(b).is_some());
        assert!(reg.get::<Brain>(a).is_none());
        assert!(reg.implements(b, Capability::Carrier));
        assert_eq!(reg.all(), vec![a, b]);
    }

    #[test]
    fn test_create_errors() {
        let mut reg = ObjectRegistry::new();
        assert!(matches!(
            reg.create(CreateParams::new(ObjectType::Null, Vec3::ZERO)),
            Err(CreateError::NotInstantiable(ObjectType::Null))
        ));
        reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO).with_id(7)).unwrap();
        assert!(matches!(
            reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO).with_id(7)),
            Err(CreateError::DuplicateId(7))
        ));
        // Next automatic id continues after the explicit one
        let c = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        assert_eq!(reg.id(c), Some(8));
    }

    #[test]
    fn test_create_with_largest_id() {
        let mut reg = ObjectRegistry::new();
        let e = reg
            .create(CreateParams::new(ObjectType::Stone, Vec3::ZERO).with_id(i32::MAX))
            .unwrap();
        assert_eq!(reg.id(e), Some(i32::MAX));
        assert_eq!(reg.find_by_id(i32::MAX), Some(e));
    }

    #[test]
    fn test_power_cell_created_and_linked() {
        let mut reg = ObjectRegistry::new();
        let bot = reg
            .create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO).with_power(0.5))
            .unwrap();
        let cell = reg.power_of(bot).unwrap();
        assert_eq!(reg.object_type(cell), Some(ObjectType::Power));
        assert_eq!(reg.transporter_of(cell), Some(bot));
        assert!((reg.attributes(cell).energy - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_destroy_is_deferred_until_sweep() {
        let mut reg = ObjectRegistry::new();
        let a = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        let b = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        assert!(reg.destroy(a));
        assert!(!reg.destroy(a));
        assert!(!reg.is_alive(a));
        assert!(reg.world().contains(a));
        assert_eq!(reg.all(), vec![b]);
        assert_eq!(reg.sweep(), 1);
        assert!(!reg.world().contains(a));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_destroy_carrier_takes_cargo() {
        let mut reg = ObjectRegistry::new();
        let bot = reg.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO)).unwrap();
        let stone = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        assert!(reg.attach_cargo(bot, stone));
        assert!(!reg.attach_cargo(bot, stone));
        reg.destroy(bot);
        assert!(!reg.is_alive(stone));
    }

    #[test]
    fn test_destroy_cargo_detaches_from_carrier() {
        let mut reg = ObjectRegistry::new();
        let bot = reg.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO)).unwrap();
        let stone = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        reg.attach_cargo(bot, stone);
        reg.destroy(stone);
        assert!(reg.cargo_of(bot).is_none());
        assert!(reg.is_alive(bot));
    }

    #[test]
    fn test_team_queries() {
        let mut reg = ObjectRegistry::new();
        reg.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO).with_team(1)).unwrap();
        reg.create(CreateParams::new(ObjectType::MobileWa, Vec3::ZERO).with_team(2)).unwrap();
        reg.create(CreateParams::new(ObjectType::Base, Vec3::ZERO).with_team(2)).unwrap();
        assert!(reg.team_exists(2));
        assert_eq!(reg.destroy_team(2), 2);
        assert!(!reg.team_exists(2));
        assert!(reg.team_exists(1));
        assert_eq!(reg.count_implementing(Capability::Programmable), 1);
    }

    #[test]
    fn test_find_nearest() {
        let mut reg = ObjectRegistry::new();
        let far = reg.create(CreateParams::new(ObjectType::Stone, at(100.0, 0.0))).unwrap();
        let near = reg.create(CreateParams::new(ObjectType::Stone, at(5.0, 0.0))).unwrap();
        assert_eq!(reg.find_nearest(None, ObjectType::Stone), Some(far));
        assert_eq!(reg.find_nearest(Some(Vec3::ZERO), ObjectType::Stone), Some(near));
        assert_eq!(reg.find_nearest(None, ObjectType::Human), None);
    }

    #[test]
    fn test_update_object_sequence() {
        let mut reg = ObjectRegistry::new();
        let a = reg.create(CreateParams::new(ObjectType::Human, Vec3::ZERO)).unwrap();
        let b = reg.create(CreateParams::new(ObjectType::Stone, Vec3::ZERO)).unwrap();
        reg.update_object(b, 0.1);
        reg.update_object(a, 0.1);
        assert!(reg.attributes(a).update_seq > reg.attributes(b).update_seq);
    }
}
