// SPDX: CC0-1.0

use crate::{eval, parse::Node, EvalCtx, Number, Point};

/// One entry per input point, in input order. `y` is `None` where evaluation
/// failed, which a plot draws as a gap.
pub type SampleResult = Vec<Point<Number, Option<Number>>>;

/// Evaluates `tree` at every `x` in `domain`. A failure at one point never
/// stops the others.
pub fn sample<I>(tree: &Node, domain: I, ctx: &EvalCtx) -> SampleResult
where
    I: IntoIterator<Item = Number>,
{
    domain
        .into_iter()
        .map(|x| Point {
            x,
            y: eval::bind_variable(tree, x, ctx).ok(),
        })
        .collect()
}

/// Splits samples into the runs of consecutive defined points that a plot
/// draws as connected segments.
pub fn segments(samples: &[Point<Number, Option<Number>>]) -> Vec<Vec<Point<Number>>> {
    let mut ret = Vec::new();
    let mut cur = Vec::new();
    for p in samples {
        match p.y {
            Some(y) => cur.push(Point { x: p.x, y }),
            None if !cur.is_empty() => ret.push(core::mem::take(&mut cur)),
            None => {}
        }
    }
    if !cur.is_empty() {
        ret.push(cur);
    }
    ret
}
