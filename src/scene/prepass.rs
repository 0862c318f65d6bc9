//! Offline rewrite of `mix` scenes into discrete per-stroke shape tags.
//!
//! Mixture strokes carry three shape weights
//! (`w_ellipsoid, w_box, w_line, h, dr, ...rest`). The pre-pass resolves
//! each stroke to the dominant weight, first-listed on ties, and rewrites it
//! as a plain family with its own `stroke_type`:
//!
//! - ellipsoid → `ellipsoid_multiscale` with `rest`
//! - box → `cube_multiscale` with `rest`
//! - line → `line_a` with `h, dr, rest`, keeping all three scales

use super::SceneFile;
use crate::encoding::mixture::{self, MixtureChoice};

/// Weights, half-length and radius delta precede the shared parameters.
const MIX_HEADER: usize = 5;

/// Rewrite every mixture stroke of `scene` into a discrete family.
///
/// Strokes too short to carry the mixture header are left untouched.
/// Returns the number of strokes rewritten.
pub fn resolve_mixtures(scene: &mut SceneFile) -> usize {
    let default_is_mix = scene.shape_type == "mix";
    let mut rewritten = 0;

    for (name, stroke) in &mut scene.stroke_params {
        let is_mix = stroke
            .stroke_type
            .as_deref()
            .map_or(default_is_mix, |t| t == "mix");
        if !is_mix {
            continue;
        }
        let params = &stroke.shape_params;
        if params.len() < MIX_HEADER + 9 {
            log::warn!("prepass: stroke '{name}' too short for a mixture, left as is");
            continue;
        }

        let logits = [params[0], params[1], params[2]];
        let (h, dr) = (params[3], params[4]);
        let rest = &params[MIX_HEADER..];
        let (tag, new_params) = match mixture::select(logits) {
            MixtureChoice::Ellipsoid => ("ellipsoid_multiscale", rest.to_vec()),
            MixtureChoice::Box => ("cube_multiscale", rest.to_vec()),
            MixtureChoice::Line => {
                let mut line = vec![h, dr];
                line.extend_from_slice(rest);
                ("line_a", line)
            }
        };
        stroke.stroke_type = Some(tag.to_owned());
        stroke.shape_params = new_params;
        rewritten += 1;
    }

    log::info!("prepass: resolved {rewritten} mixture strokes");
    rewritten
}
