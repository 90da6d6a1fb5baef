//! Data model describing one beam and its surroundings, as handed over by
//! the engraving framework.
//!
//! These structures are flattened values: positions, directions and flags.
//! Vertical quantities are in absolute units relative to the beam's own
//! reference point; the problem builder scales them to staff spaces.

use serde::{Deserialize, Serialize};

use crate::geometry::{BeamPositions, BoundingBox, Direction, Interval};

/// Staff and beam dimensions, in absolute units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaffGeometry {
    /// Distance between two staff lines
    pub staff_space: f64,
    /// Thickness of a staff line
    pub line_thickness: f64,
    /// Half the number of staff lines minus one (2 for a five-line staff)
    pub staff_radius: f64,
    /// Thickness of one beam
    pub beam_thickness: f64,
    /// Vertical distance between stacked beams
    pub beam_translation: f64,
}

impl Default for StaffGeometry {
    fn default() -> Self {
        Self {
            staff_space: 1.0,
            line_thickness: 0.1,
            staff_radius: 2.0,
            beam_thickness: 0.48,
            beam_translation: 0.75,
        }
    }
}

/// One stem joined by the beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemInput {
    /// Identifier shared with `CoveredStem::id`. Needed only when covered
    /// objects include this beam's own note heads; stems without one are
    /// never matched against covered stems.
    #[serde(default)]
    pub id: Option<usize>,
    /// Horizontal position
    pub x: f64,
    /// Stem direction
    pub direction: Direction,
    /// Preferred y of the stem end
    pub ideal_y: f64,
    /// Lowest (for up stems) or highest (for down stems) allowed stem end
    pub shortest_y: f64,
    /// False for grace and invisible stems, which the beam ignores
    #[serde(default = "default_true")]
    pub normal: bool,
    /// Index distance between the outermost beams on this stem
    /// (0 for a single beam)
    #[serde(default)]
    pub multiplicity_span: u32,
    /// Lowest and highest note head, in staff positions (half staff spaces)
    #[serde(default = "default_head_positions")]
    pub head_positions: Interval,
    /// Y of the note head where the stem starts
    #[serde(default)]
    pub chord_start_y: f64,
    /// Offset of the stem end when the beam sits at y = 0
    #[serde(default)]
    pub base_length: f64,
}

fn default_true() -> bool {
    true
}

fn default_head_positions() -> Interval {
    Interval::point(0.0)
}

/// Stem attached to a note head that the beam passes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveredStem {
    /// Identifier; stems joined by this beam carry the same id in `StemInput`.
    /// Required, so a stem is never mistaken for one of the beam's own.
    pub id: usize,
    /// Horizontal center
    pub x: f64,
    pub direction: Direction,
    /// Y of the note head where the stem starts
    pub chord_start_y: f64,
    /// False for grace and invisible stems
    #[serde(default = "default_true")]
    pub normal: bool,
    /// Whether the stem ends in a beam of its own
    #[serde(default)]
    pub beamed: bool,
}

/// An already placed object whose horizontal extent the beam crosses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveredObject {
    /// Bounding box, in the beam's reference frame
    pub extent: BoundingBox,
    /// Whether the object is itself a beam
    #[serde(default)]
    pub is_beam: bool,
    /// Whether the object spans more than one staff
    #[serde(default)]
    pub cross_staff: bool,
    /// For note heads: the stem attached to the head
    #[serde(default)]
    pub note_head_stem: Option<CoveredStem>,
}

/// A horizontal piece of this beam at one stacking level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamSegment {
    /// Horizontal extent
    pub horizontal: Interval,
    /// Stacking level, signed in the direction the beams stack
    pub vertical_count: i32,
}

/// Everything the quanting engine needs to know about one beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamInput {
    /// Staff dimensions
    #[serde(default)]
    pub staff: StaffGeometry,
    /// Stems in left-to-right order
    pub stems: Vec<StemInput>,
    /// Objects under or over the beam
    #[serde(default)]
    pub covered: Vec<CoveredObject>,
    /// Segments of this beam; one level-0 segment over the whole beam
    /// is assumed when empty
    #[serde(default)]
    pub segments: Vec<BeamSegment>,
    /// Whether the beam connects stems on different staves
    #[serde(default)]
    pub cross_staff: bool,
    /// X reference point stems and covered objects are measured against
    #[serde(default)]
    pub x_refpoint: u32,
    /// X reference point the beam segments were measured against
    #[serde(default)]
    pub segment_x_refpoint: u32,
    /// Unquantized positions in staff spaces; computed when absent
    #[serde(default)]
    pub positions: Option<BeamPositions>,
    /// Slope implied by the melody, in staff spaces; computed when absent
    #[serde(default)]
    pub musical_dy: Option<f64>,
    /// Slope damping strength
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Concaveness of the melodic contour
    #[serde(default)]
    pub concaveness: f64,
}

fn default_damping() -> f64 {
    1.0
}

impl BeamInput {
    /// Creates an input with default staff geometry and no surroundings.
    pub fn new(stems: Vec<StemInput>) -> Self {
        Self {
            staff: StaffGeometry::default(),
            stems,
            covered: Vec::new(),
            segments: Vec::new(),
            cross_staff: false,
            x_refpoint: 0,
            segment_x_refpoint: 0,
            positions: None,
            musical_dy: None,
            damping: default_damping(),
            concaveness: 0.0,
        }
    }

    pub fn normal_stems(&self) -> impl Iterator<Item = &StemInput> {
        self.stems.iter().filter(|s| s.normal)
    }

    pub fn first_normal_stem(&self) -> Option<&StemInput> {
        self.stems.iter().find(|s| s.normal)
    }

    pub fn last_normal_stem(&self) -> Option<&StemInput> {
        self.stems.iter().rev().find(|s| s.normal)
    }
}

impl StemInput {
    /// A normal stem with a single beam and its head on the middle line.
    pub fn new(x: f64, direction: Direction, ideal_y: f64, shortest_y: f64) -> Self {
        Self {
            id: None,
            x,
            direction,
            ideal_y,
            shortest_y,
            normal: true,
            multiplicity_span: 0,
            head_positions: default_head_positions(),
            chord_start_y: 0.0,
            base_length: 0.0,
        }
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the note head range; `chord_start_y` follows, for a unit staff space.
    pub fn with_heads(mut self, lowest: f64, highest: f64) -> Self {
        self.head_positions = Interval::new(lowest, highest);
        let start = if self.direction == Direction::Down { highest } else { lowest };
        self.chord_start_y = start * 0.5;
        self
    }

    pub fn with_multiplicity_span(mut self, span: u32) -> Self {
        self.multiplicity_span = span;
        self
    }
}
