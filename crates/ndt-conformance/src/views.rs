#![deny(unsafe_code)]

use crate::{ensure, record_case, HarnessConfig, SuiteReport};
use ndarray::{array, s};
use ndt_check::exact_eq;

const CASES: &[(&str, fn() -> Result<(), String>)] = &[
    ("view_shares_storage", view_shares_storage),
    ("slice_assignment_writes_through", slice_assignment_writes_through),
    ("deep_copy_is_independent", deep_copy_is_independent),
    ("owned_slice_detaches", owned_slice_detaches),
];

pub fn run_views_suite(_config: &HarnessConfig) -> Result<SuiteReport, String> {
    let mut report = SuiteReport::new("views");
    for (case_id, case) in CASES {
        record_case(&mut report, case_id, case())?;
    }
    Ok(report)
}

fn view_shares_storage() -> Result<(), String> {
    let mut a = array![[1i64, 2, 3, 4], [5, 6, 7, 8]];
    exact_eq(a.view(), array![[1i64, 2, 3, 4], [5, 6, 7, 8]].view())
        .map_err(|err| format!("read view: {err}"))?;
    {
        let mut b = a.view_mut();
        b[[0, 3]] = 10;
    }
    ensure(a[[0, 3]] == 10, format!("base saw {}", a[[0, 3]]))?;
    exact_eq(a.view(), array![[1i64, 2, 3, 10], [5, 6, 7, 8]].view())
        .map_err(|err| format!("base after view write: {err}"))
}

fn slice_assignment_writes_through() -> Result<(), String> {
    let mut a = array![[1i64, 2, 3, 4], [5, 6, 7, 8]];
    a.slice_mut(s![.., 3]).fill(10);
    exact_eq(a.view(), array![[1i64, 2, 3, 10], [5, 6, 7, 10]].view())
        .map_err(|err| format!("base after column fill: {err}"))
}

fn deep_copy_is_independent() -> Result<(), String> {
    let a = array![[1i64, 2, 3, 4], [5, 6, 7, 8]];
    let mut b = a.clone();
    b[[0, 0]] = 10;
    ensure(b[[0, 0]] == 10, format!("copy holds {}", b[[0, 0]]))?;
    exact_eq(a.view(), array![[1i64, 2, 3, 4], [5, 6, 7, 8]].view())
        .map_err(|err| format!("base after copy write: {err}"))
}

fn owned_slice_detaches() -> Result<(), String> {
    let mut a = array![[1i64, 2, 3, 4], [5, 6, 7, 8]];
    let column = a.slice(s![.., 3]).to_owned();
    a.slice_mut(s![.., 3]).fill(0);
    exact_eq(column.view(), array![4i64, 8].view())
        .map_err(|err| format!("detached column: {err}"))
}
