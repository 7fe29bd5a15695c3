use core::fmt;

use crate::functor::SurfaceId;

/// Integer scissor rect in target pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Native GPU state the pipeline relies on between its own commands.
///
/// The pipeline owns the expected value. Functors receive mutable access to the
/// live value while they run and are expected to leave it as they found it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GpuState {
    /// Render target currently bound for native drawing.
    pub bound_target: Option<SurfaceId>,
    /// Active scissor, `None` when scissoring is disabled.
    pub scissor: Option<ScissorRect>,
    /// Whether a native command recording is open.
    pub recording: bool,
}

impl GpuState {
    /// Fields of `self` that differ from `expected`.
    pub fn diff(&self, expected: &GpuState) -> StateDiff {
        StateDiff {
            bound_target: self.bound_target != expected.bound_target,
            scissor: self.scissor != expected.scissor,
            recording: self.recording != expected.recording,
        }
    }
}

/// Which parts of [`GpuState`] were found altered.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct StateDiff {
    pub bound_target: bool,
    pub scissor: bool,
    pub recording: bool,
}

impl StateDiff {
    #[inline]
    pub fn is_clean(self) -> bool {
        !(self.bound_target || self.scissor || self.recording)
    }
}

impl fmt::Display for StateDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            (self.bound_target, "bound target"),
            (self.scissor, "scissor"),
            (self.recording, "open recording"),
        ];
        let mut first = true;
        for (_, name) in fields.iter().filter(|(changed, _)| *changed) {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_states_have_clean_diff() {
        let s = GpuState { recording: true, ..GpuState::default() };
        assert!(s.diff(&s).is_clean());
    }

    #[test]
    fn diff_names_changed_fields() {
        let expected = GpuState::default();
        let live = GpuState {
            bound_target: Some(SurfaceId(7)),
            recording: true,
            ..GpuState::default()
        };
        let diff = live.diff(&expected);
        assert!(!diff.is_clean());
        assert!(!diff.scissor);
        assert_eq!(diff.to_string(), "bound target, open recording");
    }
}
