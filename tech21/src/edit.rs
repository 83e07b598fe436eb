//!
//! # Field Edits
//!
//! Interactive edits of one scalar field of one entity.
//! An [EditRequest] describes the field to a [Prompter], which answers with a typed [FieldValue].
//! Applying it updates the [Technology] and yields the [ChangeList] bringing the library in line:
//! rewritten label text, re-colored layer patches, or whole regenerated cells.
//!

// Crates.io
use log::{debug, info};

// Local imports
use crate::generate::{patch_attrs, Generator};
use crate::labels::*;
use crate::model::*;
use crate::prefs::Preferences;
use crate::tags::{self, Role};
use crate::{TechError, TechResult};
use tech21raw::utils::EnumStr;
use tech21raw::{AttrValue, ChangeList, Library};

/// # Entity Reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    /// The technology's general information
    Info,
    Layer(String),
    Arc(String),
    Node(String),
}
impl EntityRef {
    /// Name of the library cell drawing us
    pub fn cell_name(&self) -> String {
        match self {
            Self::Info => tags::INFO_CELL.into(),
            Self::Layer(n) => format!("{}{}", tags::LAYER_PREFIX, n),
            Self::Arc(n) => format!("{}{}", tags::ARC_PREFIX, n),
            Self::Node(n) => format!("{}{}", tags::NODE_PREFIX, n),
        }
    }
    /// The entity drawn by cell `name`, if any
    pub fn from_cell_name(name: &str) -> Option<Self> {
        if name == tags::INFO_CELL {
            return Some(Self::Info);
        }
        if let Some(n) = name.strip_prefix(tags::LAYER_PREFIX) {
            return Some(Self::Layer(n.into()));
        }
        if let Some(n) = name.strip_prefix(tags::ARC_PREFIX) {
            return Some(Self::Arc(n.into()));
        }
        name.strip_prefix(tags::NODE_PREFIX).map(|n| Self::Node(n.into()))
    }
}

/// # Edit Request
///
/// Everything a [Prompter] needs to ask for one field's new value.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub entity: EntityRef,
    /// Field name, as it appears in label text
    pub field: String,
    pub prompt: String,
    pub current: FieldValue,
    /// Permitted values of enumerated fields
    pub choices: Option<Vec<String>>,
    kind: FieldKind,
}
impl EditRequest {
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// # Prompter
///
/// Source of new field values, typically an interactive dialog.
pub trait Prompter {
    /// Ask for a new value for `request`. `None` cancels the edit.
    fn prompt(&mut self, request: &EditRequest) -> Option<FieldValue>;
}

/// Look up `field` of `entity`, case-insensitively
fn lookup<D: Described>(entity: &D, field: &str) -> TechResult<(D::Field, FieldKind, FieldValue)> {
    let f = match D::Field::from_str_nocase(field) {
        Some(f) => f,
        None => return TechError::fail(format!("no editable field `{}`", field)),
    };
    Ok((f, D::kind(f), entity.get(f)))
}

fn missing(entity: &EntityRef) -> TechError {
    TechError::reference(entity.cell_name(), "no such entity in the technology")
}

/// Build the request for editing `field` of `entity`
pub fn request(tech: &Technology, entity: &EntityRef, field: &str) -> TechResult<EditRequest> {
    let (field, kind, current, what) = match entity {
        EntityRef::Info => {
            let (f, k, v) = lookup(&tech.general, field)?;
            (f.to_str(), k, v, format!("technology `{}`", tech.general.name))
        }
        EntityRef::Layer(name) => {
            let layer = tech.layer(name).ok_or_else(|| missing(entity))?;
            let (f, k, v) = lookup(layer, field)?;
            (f.to_str(), k, v, format!("layer `{}`", name))
        }
        EntityRef::Arc(name) => {
            let arc = tech.arc(name).ok_or_else(|| missing(entity))?;
            let (f, k, v) = lookup(arc, field)?;
            (f.to_str(), k, v, format!("arc `{}`", name))
        }
        EntityRef::Node(name) => {
            let node = tech.node(name).ok_or_else(|| missing(entity))?;
            let (f, k, v) = lookup(node, field)?;
            (f.to_str(), k, v, format!("node `{}`", name))
        }
    };
    let choices = match &kind {
        FieldKind::Choice(c) => Some(c.clone()),
        _ => None,
    };
    Ok(EditRequest {
        entity: entity.clone(),
        field: field.to_string(),
        prompt: format!("{} of {}", field, what),
        current,
        choices,
        kind,
    })
}

/// What an applied edit requires of the library
enum Effect {
    /// Rewrite the field's label
    Label(String),
    /// Rewrite the label, and the graphics attributes of every patch of the layer
    Graphics(String),
    /// Regenerate the entity's cell
    Regenerate,
    /// Regenerate the entity's cell, and those of transistors connecting to the arc
    RegenerateGates,
    /// Rewrite the label, and regenerate every arc and node cell drawing on the layer
    RegenerateUsers(String),
}

/// Set `field` of `entity` to `value`
fn set<D: Described>(entity: &mut D, field: &str, value: FieldValue) -> TechResult<(D::Field, String)> {
    let f = match D::Field::from_str_nocase(field) {
        Some(f) => f,
        None => return TechError::fail(format!("no editable field `{}`", field)),
    };
    entity.set(f, value).map_err(TechError::msg)?;
    let text = label_text(f.to_str(), &entity.get(f));
    Ok((f, text))
}

/// Apply `value` to the field of `request`, updating `tech`.
/// Returns the changes bringing `lib` up to date with the edit.
pub fn apply_edit(
    tech: &mut Technology,
    lib: &Library,
    prefs: &Preferences,
    request: &EditRequest,
    value: FieldValue,
) -> TechResult<ChangeList> {
    if !value.fits(&request.kind) {
        return TechError::fail(format!("invalid value `{}` for {}", value, request.prompt));
    }
    let entity = &request.entity;
    let effect = match entity {
        EntityRef::Info => {
            let (_, text) = set(&mut tech.general, &request.field, value)?;
            Effect::Label(text)
        }
        EntityRef::Layer(name) => {
            let layer = tech.layer_mut(name).ok_or_else(|| missing(entity))?;
            let (f, text) = set(layer, &request.field, value)?;
            match f {
                LayerField::Color | LayerField::Style => Effect::Graphics(text),
                LayerField::Extra => Effect::RegenerateUsers(text),
                _ => Effect::Label(text),
            }
        }
        EntityRef::Arc(name) => {
            let arc = tech.arc_mut(name).ok_or_else(|| missing(entity))?;
            let (f, text) = set(arc, &request.field, value)?;
            match f {
                ArcField::DefaultWidth | ArcField::Extend => Effect::Regenerate,
                ArcField::Function => Effect::RegenerateGates,
                _ => Effect::Label(text),
            }
        }
        EntityRef::Node(name) => {
            let node = tech.node_mut(name).ok_or_else(|| missing(entity))?;
            let (f, text) = set(node, &request.field, value)?;
            match f {
                NodeField::Square | NodeField::SizeOffset | NodeField::Function => Effect::Regenerate,
                _ => Effect::Label(text),
            }
        }
    };
    info!("Edited {}", request.prompt);

    let tech: &Technology = tech;
    let mut changes = ChangeList::new();
    match effect {
        Effect::Label(text) => relabel(lib, entity, &request.field, text, tech, prefs, &mut changes)?,
        Effect::Graphics(text) => {
            relabel(lib, entity, &request.field, text, tech, prefs, &mut changes)?;
            if let EntityRef::Layer(name) = entity {
                recolor(lib, tech, name, &mut changes)?;
            }
        }
        Effect::Regenerate => changes.append(regenerate(tech, prefs, entity)?),
        Effect::RegenerateGates => {
            changes.append(regenerate(tech, prefs, entity)?);
            if let EntityRef::Arc(arc) = entity {
                for node in tech.nodes.iter().filter(|n| gated_by(n, arc)) {
                    debug!("Arc `{}` edit regenerates transistor `{}`", arc, node.name);
                    changes.append(regenerate(tech, prefs, &EntityRef::Node(node.name.clone()))?);
                }
            }
        }
        Effect::RegenerateUsers(text) => {
            relabel(lib, entity, &request.field, text, tech, prefs, &mut changes)?;
            if let EntityRef::Layer(layer) = entity {
                for user in users_of(tech, layer) {
                    debug!("Layer `{}` edit regenerates `{}`", layer, user.cell_name());
                    changes.append(regenerate(tech, prefs, &user)?);
                }
            }
        }
    }
    Ok(changes)
}

/// Arcs and nodes with a rule drawing on `layer`
fn users_of(tech: &Technology, layer: &str) -> Vec<EntityRef> {
    let arcs = tech
        .arcs
        .iter()
        .filter(|a| a.layers.iter().any(|r| r.layer == layer))
        .map(|a| EntityRef::Arc(a.name.clone()));
    let nodes = tech
        .nodes
        .iter()
        .filter(|n| n.layers.iter().any(|r| r.layer == layer))
        .map(|n| EntityRef::Node(n.name.clone()));
    arcs.chain(nodes).collect()
}

/// Whether transistor `node` has a port connecting to `arc`
fn gated_by(node: &NodeDescription, arc: &str) -> bool {
    if !node.function.is_transistor() {
        return false;
    }
    let ports = node.ports.iter().chain(node.group.iter().flat_map(|m| m.ports.iter()));
    ports.flat_map(|p| p.arcs.iter()).any(|a| a == arc)
}

/// Changes rewriting the label of `field` in the cell of `entity`.
/// A cell without that label is regenerated instead.
fn relabel(
    lib: &Library,
    entity: &EntityRef,
    field: &str,
    text: String,
    tech: &Technology,
    prefs: &Preferences,
    changes: &mut ChangeList,
) -> TechResult<()> {
    let key = match lib.cell_key(&entity.cell_name()) {
        Some(k) => k,
        None => {
            changes.append(regenerate(tech, prefs, entity)?);
            return Ok(());
        }
    };
    let label = lib.instances(key)?.find(|(_, inst)| {
        inst.attr(tags::ROLE).and_then(AttrValue::as_str) == Some(Role::Label.to_str())
            && inst
                .attr(tags::FIELD)
                .and_then(AttrValue::as_str)
                .map_or(false, |f| f.eq_ignore_ascii_case(field))
    });
    match label {
        Some((inst, _)) => changes.set_attr(inst, tags::MESSAGE, text),
        None => changes.append(regenerate(tech, prefs, entity)?),
    }
    Ok(())
}

/// Changes rewriting the graphics attributes of every patch of layer `name`, in every cell of `lib`
fn recolor(lib: &Library, tech: &Technology, name: &str, changes: &mut ChangeList) -> TechResult<()> {
    let layer = tech.layer(name).ok_or_else(|| TechError::reference(name, "no such layer"))?;
    let attrs = patch_attrs(layer);
    let mut count = 0;
    for key in lib.cell_keys() {
        for (inst, i) in lib.instances(key)? {
            let is_patch = i.attr(tags::ROLE).and_then(AttrValue::as_str) == Some(Role::LayerPatch.to_str());
            if is_patch && i.attr(tags::LAYER).and_then(AttrValue::as_str) == Some(name) {
                for k in [tags::COLOR, tags::FILL] {
                    if let Some(v) = attrs.get(k) {
                        changes.set_attr(inst, k, v.clone());
                    }
                }
                count += 1;
            }
        }
    }
    debug!("Recolored {} patches of layer `{}`", count, name);
    Ok(())
}

/// Changes regenerating the cell of `entity` from `tech`
fn regenerate(tech: &Technology, prefs: &Preferences, entity: &EntityRef) -> TechResult<ChangeList> {
    let gen = Generator::new(tech, prefs);
    let plan = match entity {
        EntityRef::Info => gen.info_cell()?,
        EntityRef::Layer(n) => gen.layer_cell(tech.layer(n).ok_or_else(|| missing(entity))?)?,
        EntityRef::Arc(n) => gen.arc_cell(tech.arc(n).ok_or_else(|| missing(entity))?)?,
        EntityRef::Node(n) => gen.node_cell(tech.node(n).ok_or_else(|| missing(entity))?)?,
    };
    debug!("Regenerating cell `{}`", plan.name);
    Ok(plan.changes)
}

/// Ask `prompter` for a new value of `field` of `entity`, and apply it.
/// Returns `None` if the prompt was cancelled.
pub fn edit<P: Prompter>(
    tech: &mut Technology,
    lib: &Library,
    prefs: &Preferences,
    entity: &EntityRef,
    field: &str,
    prompter: &mut P,
) -> TechResult<Option<ChangeList>> {
    let request = request(tech, entity, field)?;
    let value = match prompter.prompt(&request) {
        Some(v) => v,
        None => return Ok(None),
    };
    Ok(Some(apply_edit(tech, lib, prefs, &request, value)?))
}
