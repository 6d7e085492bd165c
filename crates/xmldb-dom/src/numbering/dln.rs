//! Dynamic level numbering.
//!
//! An identifier is a list of levels, one per step from the root, and each
//! level is a list of components: the sibling position first, then optional
//! sub-level components for nodes inserted between existing siblings. The
//! text form separates levels with `.` and sub-levels with `/`, e.g.
//! `1.2/1.3`.
//!
//! Bit layout, most significant bit first:
//!
//! * every component except the very first is preceded by one separator
//!   bit, `0` for a new level and `1` for a sub-level;
//! * a component value is stored in `n` four-bit units: `n - 1` one-bits,
//!   a zero-bit, then `3n` bits holding the value minus the range offset
//!   of `n` (0 for one unit, 8 for two, 72 for three, ...).
//!
//! The code is prefix-free, so comparing two identifiers as plain bit strings
//! (a prefix sorts first) yields document order, and an ancestor's bits are a
//! prefix of its descendants' bits followed by a level separator.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use smallvec::{SmallVec, smallvec};

use super::Relation;
use crate::error::{DomError, Result};

/// Largest unit count a single component may use; eleven units cover `u32`.
const MAX_COMPONENT_UNITS: u32 = 11;
/// Sub-level appended when a node must be placed before position 1.
const GAP_SUBLEVEL: u32 = 35;

type Bits = SmallVec<[u8; 8]>;
type Components = SmallVec<[Component; 8]>;
type LevelValues = SmallVec<[u32; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Component {
    sublevel: bool,
    value: u32,
    /// Bit position of the separator (or of the value for the first component).
    start: usize,
}

fn component_offset(units: u32) -> u64 {
    (1..units).map(|k| 8u64.pow(k)).sum()
}

fn component_units(value: u32) -> u32 {
    let value = u64::from(value);
    (1..MAX_COMPONENT_UNITS).find(|&n| value < component_offset(n + 1)).unwrap_or(MAX_COMPONENT_UNITS)
}

/// Node identifier in dynamic level numbering.
///
/// The empty identifier is the document node: it has tree level 0, is an
/// ancestor of every other identifier and sorts before all of them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    bits: Bits,
    len: usize,
}

#[derive(Default)]
struct BitWriter {
    bits: Bits,
    len: usize,
}

impl BitWriter {
    fn prefix_of(id: &NodeId, len: usize) -> Self {
        let nbytes = len.div_ceil(8);
        let mut bits: Bits = SmallVec::from_slice(&id.bits[..nbytes]);
        let rem = len % 8;
        if rem != 0 {
            bits[nbytes - 1] &= 0xFF << (8 - rem);
        }
        Self { bits, len }
    }

    fn push_bit(&mut self, set: bool) {
        if self.len % 8 == 0 {
            self.bits.push(0);
        }
        if set {
            self.bits[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    fn push_component(&mut self, sublevel: bool, value: u32) {
        if self.len > 0 {
            self.push_bit(sublevel);
        }
        let units = component_units(value);
        for _ in 1..units {
            self.push_bit(true);
        }
        self.push_bit(false);
        let raw = u64::from(value) - component_offset(units);
        for shift in (0..3 * units).rev() {
            self.push_bit((raw >> shift) & 1 == 1);
        }
    }

    /// Appends one level: its sibling position followed by sub-levels.
    fn push_level(&mut self, values: &[u32]) {
        for (i, &value) in values.iter().enumerate() {
            self.push_component(i > 0, value);
        }
    }

    fn finish(self) -> NodeId {
        NodeId { bits: self.bits, len: self.len }
    }
}

fn bit_at(bits: &[u8], pos: usize) -> bool {
    bits[pos / 8] & (0x80 >> (pos % 8)) != 0
}

fn scan(bits: &[u8], len: usize) -> core::result::Result<Components, String> {
    let mut out = Components::new();
    let mut pos = 0;
    while pos < len {
        let start = pos;
        let sublevel = if out.is_empty() {
            false
        } else {
            pos += 1;
            bit_at(bits, start)
        };
        let mut units = 1;
        while pos < len && bit_at(bits, pos) {
            units += 1;
            pos += 1;
            if units > MAX_COMPONENT_UNITS {
                return Err(format!("component at bit {start} exceeds {MAX_COMPONENT_UNITS} units"));
            }
        }
        let width = 3 * units as usize;
        if pos + 1 + width > len {
            return Err(format!("component at bit {start} truncated after {len} bits"));
        }
        pos += 1;
        let mut raw = 0u64;
        for _ in 0..width {
            raw = (raw << 1) | u64::from(bit_at(bits, pos));
            pos += 1;
        }
        let value = u32::try_from(raw + component_offset(units))
            .map_err(|_| format!("component at bit {start} overflows u32"))?;
        out.push(Component { sublevel, value, start });
    }
    Ok(out)
}

/// Level values sorting after an empty level and before `tail`.
fn below(tail: &[u32]) -> Option<LevelValues> {
    let (&first, rest) = tail.split_first()?;
    match first {
        0 => {
            let mut out: LevelValues = smallvec![0];
            out.extend(below(rest)?);
            Some(out)
        }
        1 => Some(smallvec![0, GAP_SUBLEVEL]),
        _ => Some(smallvec![first - 1]),
    }
}

/// Level values strictly between `left` and `right`, given `left < right`.
fn between(left: &[u32], right: &[u32]) -> Option<LevelValues> {
    let split = left.iter().zip(right).position(|(l, r)| l != r).unwrap_or(left.len().min(right.len()));
    let mut out: LevelValues = SmallVec::from_slice(left);
    if split == left.len() {
        out.extend(below(&right[split..])?);
        return Some(out);
    }
    let last = left.len() - 1;
    if split < last || left[last].saturating_add(1) < right[split] {
        out[last] = left[last].checked_add(1)?;
    } else {
        out.push(1);
    }
    Some(out)
}

impl NodeId {
    pub fn document() -> Self {
        Self { bits: SmallVec::new(), len: 0 }
    }

    /// The document element, `1`.
    pub fn root() -> Self {
        Self::from_levels(&[1])
    }

    /// Builds an identifier from plain sibling positions, one per level.
    pub fn from_levels(levels: &[u32]) -> Self {
        let mut writer = BitWriter::default();
        for &value in levels {
            writer.push_component(false, value);
        }
        writer.finish()
    }

    /// Reads an identifier of `units` significant bits stored in exactly
    /// `ceil(units / 8)` bytes.
    pub fn from_data(units: u16, data: &[u8]) -> Result<Self> {
        let len = usize::from(units);
        let nbytes = len.div_ceil(8);
        if data.len() != nbytes {
            return Err(DomError::format("node id", format!("{units} units need {nbytes} bytes, got {}", data.len())));
        }
        let mut bits: Bits = SmallVec::from_slice(data);
        if len % 8 != 0 {
            bits[nbytes - 1] &= 0xFF << (8 - len % 8);
        }
        scan(&bits, len).map_err(|message| DomError::format("node id", message))?;
        Ok(Self { bits, len })
    }

    pub fn is_document(&self) -> bool {
        self.len == 0
    }

    /// Number of significant bits.
    pub fn units(&self) -> usize {
        self.len
    }

    /// Stored size in bytes.
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bits);
    }

    fn components(&self) -> Components {
        scan(&self.bits, self.len).unwrap_or_default()
    }

    /// Index of the component opening the last level.
    fn last_level_start(components: &[Component]) -> usize {
        components.iter().rposition(|c| !c.sublevel).unwrap_or(0)
    }

    fn last_level_values(components: &[Component]) -> LevelValues {
        components[Self::last_level_start(components)..].iter().map(|c| c.value).collect()
    }

    fn with_last_level(&self, components: &[Component], values: &[u32]) -> NodeId {
        let start = components[Self::last_level_start(components)].start;
        let mut writer = BitWriter::prefix_of(self, start);
        writer.push_level(values);
        writer.finish()
    }

    /// Number of levels; 0 for the document node.
    pub fn tree_level(&self) -> usize {
        self.components().iter().filter(|c| !c.sublevel).count()
    }

    pub fn parent(&self) -> Option<NodeId> {
        if self.is_document() {
            return None;
        }
        let components = self.components();
        let last = Self::last_level_start(&components);
        Some(BitWriter::prefix_of(self, components[last].start).finish())
    }

    /// First child of this node.
    pub fn new_child(&self) -> NodeId {
        self.child(1)
    }

    /// Child at sibling `position`.
    pub fn child(&self, position: u32) -> NodeId {
        let mut writer = BitWriter::prefix_of(self, self.len);
        writer.push_component(false, position);
        writer.finish()
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        let components = self.components();
        let last = components.last()?;
        let mut writer = BitWriter::prefix_of(self, last.start);
        writer.push_component(last.sublevel, last.value.checked_add(1)?);
        Some(writer.finish())
    }

    pub fn preceding_sibling(&self) -> Option<NodeId> {
        let components = self.components();
        let last = components.last()?;
        if last.value <= 1 {
            return None;
        }
        let mut writer = BitWriter::prefix_of(self, last.start);
        writer.push_component(last.sublevel, last.value - 1);
        Some(writer.finish())
    }

    /// Identifier for a node inserted directly before this one when no left
    /// neighbour is known.
    pub fn insert_before(&self) -> Option<NodeId> {
        if self.is_document() {
            return None;
        }
        let components = self.components();
        let values = below(&Self::last_level_values(&components))?;
        Some(self.with_last_level(&components, &values))
    }

    /// Identifier for a node inserted after this one and before `right`.
    ///
    /// Without a right neighbour this is the next sibling. Returns `None` when
    /// `right` is not a following sibling.
    pub fn insert_node(&self, right: Option<&NodeId>) -> Option<NodeId> {
        let Some(right) = right else {
            return self.next_sibling();
        };
        if self.is_document() || self >= right || !self.is_sibling_of(right) {
            return None;
        }
        let components = self.components();
        let left_values = Self::last_level_values(&components);
        let right_values = Self::last_level_values(&right.components());
        let values = between(&left_values, &right_values)?;
        Some(self.with_last_level(&components, &values))
    }

    fn starts_with(&self, prefix: &NodeId) -> bool {
        if prefix.len > self.len {
            return false;
        }
        let full = prefix.len / 8;
        if self.bits[..full] != prefix.bits[..full] {
            return false;
        }
        let rem = prefix.len % 8;
        rem == 0 || {
            let mask = 0xFFu8 << (8 - rem);
            self.bits[full] & mask == prefix.bits[full] & mask
        }
    }

    pub fn is_descendant_of(&self, ancestor: &NodeId) -> bool {
        if ancestor.is_document() {
            return !self.is_document();
        }
        self.len > ancestor.len && self.starts_with(ancestor) && !bit_at(&self.bits, ancestor.len)
    }

    pub fn is_descendant_or_self_of(&self, ancestor: &NodeId) -> bool {
        self == ancestor || self.is_descendant_of(ancestor)
    }

    pub fn is_child_of(&self, parent: &NodeId) -> bool {
        self.is_descendant_of(parent) && self.parent().as_ref() == Some(parent)
    }

    pub fn is_sibling_of(&self, other: &NodeId) -> bool {
        self != other && !self.is_document() && self.parent() == other.parent()
    }

    /// How this node relates to `ancestor`, or `None` when it is not in
    /// `ancestor`'s subtree.
    pub fn compute_relation(&self, ancestor: &NodeId) -> Option<Relation> {
        if self == ancestor {
            Some(Relation::Self_)
        } else if !self.is_descendant_of(ancestor) {
            None
        } else if self.parent().as_ref() == Some(ancestor) {
            Some(Relation::Child)
        } else {
            Some(Relation::Descendant)
        }
    }

    /// True if this node comes before `other` in document order. With
    /// `is_preceding` the preceding axis is meant and ancestors of `other`
    /// do not count.
    pub fn before(&self, other: &NodeId, is_preceding: bool) -> bool {
        self < other && !(is_preceding && other.is_descendant_of(self))
    }

    /// True if this node comes after `other` in document order. With
    /// `is_following` the following axis is meant and descendants of `other`
    /// do not count.
    pub fn after(&self, other: &NodeId, is_following: bool) -> bool {
        self > other && !(is_following && self.is_descendant_of(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        let common = self.len.min(other.len);
        let full = common / 8;
        match self.bits[..full].cmp(&other.bits[..full]) {
            Ordering::Equal => {}
            ord => return ord,
        }
        let rem = common % 8;
        if rem != 0 {
            let mask = 0xFFu8 << (8 - rem);
            match (self.bits[full] & mask).cmp(&(other.bits[full] & mask)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.len.cmp(&other.len)
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_document() {
            return f.write_str("/");
        }
        for (i, component) in self.components().iter().enumerate() {
            if i > 0 {
                f.write_str(if component.sublevel { "/" } else { "." })?;
            }
            write!(f, "{}", component.value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl FromStr for NodeId {
    type Err = DomError;

    /// Parses the dotted text form; `/` alone is the document node.
    fn from_str(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Self::document());
        }
        let mut writer = BitWriter::default();
        let mut sublevel = false;
        let mut rest = s;
        loop {
            let end = rest.find(['.', '/']).unwrap_or(rest.len());
            let value: u32 = rest[..end]
                .parse()
                .map_err(|_| DomError::format("node id text", format!("bad component {:?} in {s:?}", &rest[..end])))?;
            writer.push_component(sublevel, value);
            if end == rest.len() {
                break;
            }
            sublevel = rest.as_bytes()[end] == b'/';
            rest = &rest[end + 1..];
        }
        Ok(writer.finish())
    }
}
