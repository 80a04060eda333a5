#![forbid(unsafe_code)]

use crate::{ensure, record_case, HarnessConfig, SuiteReport};
use ndarray::{array, Array, Array1, Array2, Axis, Zip};
use ndarray_stats::QuantileExt;
use ndt_check::{allclose, exact_eq, Tolerance};
use num_complex::Complex64;

const CASES: &[(&str, fn() -> Result<(), String>)] = &[
    ("gather_with_index_arrays", gather_with_index_arrays),
    ("palette_lookup", palette_lookup),
    ("paired_index_arrays", paired_index_arrays),
    ("row_and_column_gathers", row_and_column_gathers),
    ("argmax_gather_matches_max", argmax_gather_matches_max),
    ("boolean_mask_assignment", boolean_mask_assignment),
    ("masked_row_and_column_selection", masked_row_and_column_selection),
    ("escape_time_iteration", escape_time_iteration),
    ("open_mesh_broadcasts", open_mesh_broadcasts),
];

pub fn run_fancy_indexing_suite(_config: &HarnessConfig) -> Result<SuiteReport, String> {
    let mut report = SuiteReport::new("fancy_indexing");
    for (case_id, case) in CASES {
        record_case(&mut report, case_id, case())?;
    }
    Ok(report)
}

fn gather_with_index_arrays() -> Result<(), String> {
    let a = Array::from_iter(0i64..12);
    let picks = [1usize, 1, 3, 8, 5];
    let gathered = a.select(Axis(0), &picks);
    exact_eq(gathered.view(), array![1i64, 1, 3, 8, 5].view())
        .map_err(|err| format!("flat gather: {err}"))?;

    let j = array![[3usize, 4], [9, 7]];
    let flat: Vec<usize> = j.iter().copied().collect();
    let squared = a
        .select(Axis(0), &flat)
        .into_shape_with_order(j.raw_dim())
        .map_err(|err| format!("gather reshape: {err}"))?;
    exact_eq(squared.view(), array![[3i64, 4], [9, 7]].view())
        .map_err(|err| format!("shaped gather: {err}"))
}

fn palette_lookup() -> Result<(), String> {
    let palette = array![
        [0i64, 0, 0],
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [255, 255, 255],
    ];
    let image = array![[0usize, 1, 2, 0], [0, 3, 4, 0]];
    let labels: Vec<usize> = image.iter().copied().collect();
    let colours = palette
        .select(Axis(0), &labels)
        .into_shape_with_order((2, 4, 3))
        .map_err(|err| format!("colour reshape: {err}"))?;
    exact_eq(
        colours.view(),
        array![
            [[0i64, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 0]],
            [[0, 0, 0], [0, 0, 255], [255, 255, 255], [0, 0, 0]],
        ]
        .view(),
    )
    .map_err(|err| format!("palette expansion: {err}"))
}

fn paired_index_arrays() -> Result<(), String> {
    let a = Array::from_iter(0i64..12)
        .into_shape_with_order((3, 4))
        .map_err(|err| format!("grid: {err}"))?;
    let i = array![[0usize, 1], [1, 2]];
    let j = array![[2usize, 1], [3, 3]];
    let picked = Zip::from(&i).and(&j).map_collect(|&row, &col| a[[row, col]]);
    exact_eq(picked.view(), array![[2i64, 5], [7, 11]].view())
        .map_err(|err| format!("paired gather: {err}"))?;
    let fixed_column = i.mapv(|row| a[[row, 2]]);
    exact_eq(fixed_column.view(), array![[2i64, 6], [6, 10]].view())
        .map_err(|err| format!("fixed column gather: {err}"))
}

fn row_and_column_gathers() -> Result<(), String> {
    let a = Array::from_iter(0i64..12)
        .into_shape_with_order((3, 4))
        .map_err(|err| format!("grid: {err}"))?;
    let i = array![[0usize, 1], [1, 2]];
    let rows = Array::from_shape_fn((2, 2, 4), |(p, q, col)| a[[i[[p, q]], col]]);
    exact_eq(
        rows.view(),
        array![
            [[0i64, 1, 2, 3], [4, 5, 6, 7]],
            [[4, 5, 6, 7], [8, 9, 10, 11]],
        ]
        .view(),
    )
    .map_err(|err| format!("row gather: {err}"))?;

    let j = array![[2usize, 1], [3, 3]];
    let columns = Array::from_shape_fn((3, 2, 2), |(row, p, q)| a[[row, j[[p, q]]]]);
    exact_eq(
        columns.view(),
        array![
            [[2i64, 1], [3, 3]],
            [[6, 5], [7, 7]],
            [[10, 9], [11, 11]],
        ]
        .view(),
    )
    .map_err(|err| format!("column gather: {err}"))
}

fn argmax_gather_matches_max() -> Result<(), String> {
    let time = Array::linspace(20.0, 145.0, 5);
    let data = Array::from_iter(0..20)
        .mapv(|x| f64::from(x).sin())
        .into_shape_with_order((5, 4))
        .map_err(|err| format!("signal grid: {err}"))?;
    let winners = data.map_axis(Axis(0), |lane| lane.argmax().unwrap_or(0));
    let gathered = Array::from_shape_fn(4, |col| data[[winners[col], col]]);
    let maxima = data.map_axis(Axis(0), |lane| {
        lane.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    });
    allclose(gathered.view(), maxima.view(), Tolerance::exact())
        .map_err(|err| format!("gathered maxima: {err}"))?;

    let winner_slice = winners
        .as_slice()
        .ok_or_else(|| "winner indices not contiguous".to_string())?;
    let stamps = time.select(Axis(0), winner_slice);
    allclose(
        stamps.view(),
        array![82.5, 20.0, 113.75, 51.25].view(),
        Tolerance::new(0.0, 1e-9),
    )
    .map_err(|err| format!("winning time stamps: {err}"))
}

fn boolean_mask_assignment() -> Result<(), String> {
    let mut a = Array::from_iter(0i64..12)
        .into_shape_with_order((3, 4))
        .map_err(|err| format!("grid: {err}"))?;
    let mask = a.mapv(|x| x > 4);
    exact_eq(
        mask.view(),
        array![
            [false, false, false, false],
            [false, true, true, true],
            [true, true, true, true],
        ]
        .view(),
    )
    .map_err(|err| format!("mask: {err}"))?;
    Zip::from(&mut a).and(&mask).for_each(|elt, &hot| {
        if hot {
            *elt = 0;
        }
    });
    exact_eq(
        a.view(),
        array![[0i64, 1, 2, 3], [4, 0, 0, 0], [0, 0, 0, 0]].view(),
    )
    .map_err(|err| format!("masked assignment: {err}"))
}

fn masked_row_and_column_selection() -> Result<(), String> {
    let a = Array::from_iter(0i64..12)
        .into_shape_with_order((3, 4))
        .map_err(|err| format!("grid: {err}"))?;
    let row_mask = [false, true, true];
    let col_mask = [true, false, true, false];
    let row_picks = mask_to_indices(&row_mask);
    let col_picks = mask_to_indices(&col_mask);

    let rows = a.select(Axis(0), &row_picks);
    exact_eq(rows.view(), array![[4i64, 5, 6, 7], [8, 9, 10, 11]].view())
        .map_err(|err| format!("row selection: {err}"))?;
    let columns = a.select(Axis(1), &col_picks);
    exact_eq(columns.view(), array![[0i64, 2], [4, 6], [8, 10]].view())
        .map_err(|err| format!("column selection: {err}"))?;

    ensure(
        row_picks.len() == col_picks.len(),
        format!("mask cardinality {} vs {}", row_picks.len(), col_picks.len()),
    )?;
    let paired: Array1<i64> = row_picks
        .iter()
        .zip(&col_picks)
        .map(|(&row, &col)| a[[row, col]])
        .collect();
    exact_eq(paired.view(), array![4i64, 10].view())
        .map_err(|err| format!("paired mask gather: {err}"))
}

fn mask_to_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(idx, &keep)| keep.then_some(idx))
        .collect()
}

// Escape-time grid over a 4x4 patch of the complex plane. Cells that blow
// past |z| = 2 on the first step are stamped with iteration 0, the rest keep
// the iteration cap.
fn escape_time_iteration() -> Result<(), String> {
    let maxit: i64 = 1;
    let ys = Array::linspace(-1.4, 1.4, 4);
    let xs = Array::linspace(-2.0, 0.8, 4);
    let c = Array::from_shape_fn((4, 4), |(row, col)| Complex64::new(xs[col], ys[row]));
    let mut z = c.clone();
    let mut divtime = Array2::<i64>::from_elem((4, 4), maxit);

    for it in 0..maxit {
        z = z.mapv(|v| v * v) + &c;
        let diverging = z.mapv(|v| v.norm_sqr() > 4.0);
        Zip::from(&mut divtime).and(&diverging).for_each(|slot, &hot| {
            if hot && *slot == maxit {
                *slot = it;
            }
        });
        Zip::from(&mut z).and(&diverging).for_each(|v, &hot| {
            if hot {
                *v = Complex64::new(2.0, 0.0);
            }
        });
    }

    exact_eq(
        divtime.view(),
        array![[0i64, 0, 0, 0], [0, 1, 1, 1], [0, 1, 1, 1], [0, 0, 0, 0]].view(),
    )
    .map_err(|err| format!("divergence stamps: {err}"))
}

fn open_mesh_broadcasts() -> Result<(), String> {
    let a = array![1i64, 2, 3, 4];
    let b = array![5i64, 6, 7];
    let c = array![8i64, 9, 10, 11, 12];
    let ax = a.view().insert_axis(Axis(1)).insert_axis(Axis(2));
    let bx = b.view().insert_axis(Axis(0)).insert_axis(Axis(2));
    let cx = c.view().insert_axis(Axis(0)).insert_axis(Axis(1));
    ensure(ax.shape() == [4, 1, 1], format!("ax shape {:?}", ax.shape()))?;
    ensure(bx.shape() == [1, 3, 1], format!("bx shape {:?}", bx.shape()))?;
    ensure(cx.shape() == [1, 1, 5], format!("cx shape {:?}", cx.shape()))?;

    let ab = &ax + &bx;
    exact_eq(
        ab.view(),
        array![
            [[6i64], [7], [8]],
            [[7], [8], [9]],
            [[8], [9], [10]],
            [[9], [10], [11]],
        ]
        .view(),
    )
    .map_err(|err| format!("two-way mesh sum: {err}"))?;

    let abc = &ab + &cx;
    exact_eq(
        abc.view(),
        array![
            [
                [14i64, 15, 16, 17, 18],
                [15, 16, 17, 18, 19],
                [16, 17, 18, 19, 20],
            ],
            [
                [15, 16, 17, 18, 19],
                [16, 17, 18, 19, 20],
                [17, 18, 19, 20, 21],
            ],
            [
                [16, 17, 18, 19, 20],
                [17, 18, 19, 20, 21],
                [18, 19, 20, 21, 22],
            ],
            [
                [17, 18, 19, 20, 21],
                [18, 19, 20, 21, 22],
                [19, 20, 21, 22, 23],
            ],
        ]
        .view(),
    )
    .map_err(|err| format!("three-way mesh sum: {err}"))
}

#[cfg(test)]
mod tests {
    use super::mask_to_indices;

    #[test]
    fn mask_positions_become_indices() {
        assert_eq!(mask_to_indices(&[true, false, true, false]), vec![0, 2]);
        assert_eq!(mask_to_indices(&[false, false]), Vec::<usize>::new());
    }
}
