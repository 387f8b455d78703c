//! Bracketed 1-D solvers shared by the contact kernels.
//!
//! The cutter solids are convex bodies of revolution, so every contact
//! problem here reduces to extremizing or root-finding a continuous scalar
//! function on a closed interval. Scan-then-refine keeps the kernels free
//! of special-case algebra for the torus and cone edge cases.

const INVPHI: f64 = 0.618_033_988_749_894_9;

/// Golden-section refinement of a maximum inside [lo, hi].
fn refine_max<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64) -> (f64, f64) {
    let mut a = lo;
    let mut b = hi;
    let mut c = b - INVPHI * (b - a);
    let mut d = a + INVPHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);
    for _ in 0..80 {
        if (b - a).abs() < 1e-13 {
            break;
        }
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INVPHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INVPHI * (b - a);
            fd = f(d);
        }
    }
    let s = 0.5 * (a + b);
    (s, f(s))
}

/// Global maximum of `f` on [lo, hi]: dense scan, then golden-section
/// refinement around the best sample. Returns (argmax, max).
pub(crate) fn max_scan<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64, samples: usize) -> (f64, f64) {
    if hi <= lo {
        return (lo, f(lo));
    }
    let n = samples.max(2);
    let step = (hi - lo) / n as f64;
    let mut best_i = 0usize;
    let mut best_v = f64::NEG_INFINITY;
    for i in 0..=n {
        let v = f(lo + i as f64 * step);
        if v > best_v {
            best_v = v;
            best_i = i;
        }
    }
    let a = lo + best_i.saturating_sub(1) as f64 * step;
    let b = (lo + (best_i + 1) as f64 * step).min(hi);
    refine_max(f, a, b)
}

/// Global minimum of `f` on [lo, hi]. Returns (argmin, min).
pub(crate) fn min_scan<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64, samples: usize) -> (f64, f64) {
    let neg = |s: f64| -f(s);
    let (s, v) = max_scan(&neg, lo, hi, samples);
    (s, -v)
}

/// Bisection root of `f` on a bracketing interval.
pub(crate) fn bisect<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64) -> f64 {
    let mut lo = lo;
    let mut hi = hi;
    let mut flo = f(lo);
    for _ in 0..100 {
        if (hi - lo).abs() < 1e-13 {
            break;
        }
        let mid = 0.5 * (lo + hi);
        let fm = f(mid);
        if (flo <= 0.0) == (fm <= 0.0) {
            lo = mid;
            flo = fm;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Overlap of the horizontal line `perp = fp` with a 2-D capsule: the
/// segment (a, b) inflated by `w`. Coordinates are (u, perp); returns the
/// u-interval of the overlap, or `None` if the line misses the capsule.
pub(crate) fn capsule_overlap(
    a: [f64; 2],
    b: [f64; 2],
    fp: f64,
    w: f64,
) -> Option<(f64, f64)> {
    if w <= 0.0 {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut any = false;

    // end-cap circles
    for c in [a, b] {
        let dp = fp - c[1];
        if dp.abs() <= w {
            let half = (w * w - dp * dp).max(0.0).sqrt();
            lo = lo.min(c[0] - half);
            hi = hi.max(c[0] + half);
            any = true;
        }
    }

    // the straight strip between the caps
    let gx = b[0] - a[0];
    let gy = b[1] - a[1];
    let len2 = gx * gx + gy * gy;
    if len2 > 1e-20 {
        let len = len2.sqrt();
        if gy.abs() > 1e-12 {
            // |cross(g, p - a)| <= w * len, linear in u
            let k = gx * (fp - a[1]);
            let u1 = (k - w * len) / gy + a[0];
            let u2 = (k + w * len) / gy + a[0];
            let (mut slo, mut shi) = if u1 <= u2 { (u1, u2) } else { (u2, u1) };
            // foot of the perpendicular must fall on the segment
            if gx.abs() > 1e-12 {
                let f1 = a[0] - (fp - a[1]) * gy / gx;
                let f2 = f1 + len2 / gx;
                let (flo, fhi) = if f1 <= f2 { (f1, f2) } else { (f2, f1) };
                slo = slo.max(flo);
                shi = shi.min(fhi);
            } else {
                // segment perpendicular to the line: foot condition is
                // u-independent
                let sigma = (fp - a[1]) * gy / len2;
                if !(0.0..=1.0).contains(&sigma) {
                    shi = f64::NEG_INFINITY;
                }
            }
            if slo <= shi {
                lo = lo.min(slo);
                hi = hi.max(shi);
                any = true;
            }
        } else if (fp - a[1]).abs() <= w {
            // segment parallel to the line
            lo = lo.min(a[0].min(b[0]));
            hi = hi.max(a[0].max(b[0]));
            any = true;
        }
    }

    if any {
        Some((lo, hi))
    } else {
        None
    }
}
