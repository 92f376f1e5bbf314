use super::{PlanPhase, PlannerSettings, PortPlanner, StowagePlanner};
use crate::domain::container::Container;
use crate::domain::diagnostic::DiagnosticCode;
use crate::domain::instruction::Instruction;
use crate::domain::types::InstructionKind;
use crate::domain::route::{CargoFile, Route};
use crate::domain::ship_plan::{ShipPlan, SpotIndex};
use crate::engine::balance::{approve_all_factory, BalanceOperation, BalanceVerdict, FnBalancePolicy};
use crate::engine::strategy::StrategyKind;
use crate::engine::validation::ValidationEngine;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ==========================================
// 测试辅助函数
// ==========================================

const ROUTE: [&str; 3] = ["AAAAA", "BBBBB", "CCCCC"];

fn create_test_route() -> Route {
    Route::new(ROUTE.iter().map(|p| p.to_string()).collect())
}

fn create_test_planner(kind: StrategyKind, ship: ShipPlan) -> PortPlanner {
    PortPlanner::from_definition(&kind.definition(), PlannerSettings::default())
        .with_state(ship, create_test_route())
}

fn ship_with(decks: usize, rows: usize, cols: usize, aboard: &[(SpotIndex, &str, &str)]) -> ShipPlan {
    let mut ship = ShipPlan::new(decks, rows, cols);
    for (at, id, dest) in aboard {
        ship.insert_container(*at, Container::new(id, 1000, dest)).unwrap();
    }
    ship
}

fn write_manifest(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("AAAAA_1.cargo_data");
    fs::write(&path, content).unwrap();
    path
}

fn at(floor: usize, x: usize, y: usize) -> SpotIndex {
    SpotIndex::new(floor, x, y)
}

fn lines(instructions: &[Instruction]) -> Vec<String> {
    instructions.iter().map(|i| i.to_string()).collect()
}

/// 以独立状态回放规划结果, 返回校验问题数
fn replay_issues(ship: ShipPlan, manifest: Option<PathBuf>, instructions: &[Instruction]) -> usize {
    let mut route = create_test_route();
    if let Some(path) = manifest {
        route.assign_manifests(vec![CargoFile {
            port: "AAAAA".to_string(),
            visit: 1,
            path,
        }]);
    }
    let policy = (approve_all_factory())();
    let mut engine = ValidationEngine::new("travel_1", ship, route, policy, false);
    engine.begin_port();
    for instruction in instructions {
        engine.process_line(&instruction.to_string());
    }
    let (_, issues) = engine.finish();
    issues.len()
}

// ==========================================
// 卸箱与阻挡箱
// ==========================================

#[test]
fn test_reload_blocker_above_destined_container() {
    let ship = ship_with(
        2,
        1,
        1,
        &[(at(0, 0, 0), "XXXU1234567", "AAAAA"), (at(1, 0, 0), "YYYU1234567", "CCCCC")],
    );
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ship.clone());

    let plan = planner.plan_port(None);

    assert_eq!(
        lines(&plan.instructions),
        vec![
            "U,YYYU1234567,1,0,0",
            "U,XXXU1234567,0,0,0",
            "L,YYYU1234567,0,0,0",
        ]
    );
    assert!(plan.reported.is_empty());
    assert_eq!(planner.phase(), PlanPhase::Done);
    assert_eq!(replay_issues(ship, None, &plan.instructions), 0, "规划结果应通过校验");
}

#[test]
fn test_move_blocker_to_other_column() {
    let ship = ship_with(
        2,
        1,
        2,
        &[(at(0, 0, 0), "XXXU1234567", "AAAAA"), (at(1, 0, 0), "YYYU1234567", "CCCCC")],
    );
    let mut planner = create_test_planner(StrategyKind::GroundFirstMove, ship.clone());

    let plan = planner.plan_port(None);

    assert_eq!(
        lines(&plan.instructions),
        vec!["M,YYYU1234567,1,0,0,0,0,1", "U,XXXU1234567,0,0,0"]
    );
    assert_eq!(replay_issues(ship, None, &plan.instructions), 0);
}

#[test]
fn test_detach_run_moves_as_block_to_other_column() {
    let ship = ship_with(
        3,
        1,
        2,
        &[
            (at(0, 0, 0), "XXXU1234567", "AAAAA"),
            (at(1, 0, 0), "YYYU1234567", "CCCCC"),
            (at(2, 0, 0), "ZZZU1234567", "CCCCC"),
        ],
    );
    let mut planner = create_test_planner(StrategyKind::RunDetach, ship.clone());
    let mut reloading = create_test_planner(StrategyKind::SameDestStack, ship.clone());

    let plan = planner.plan_port(None);

    assert_eq!(
        lines(&plan.instructions),
        vec![
            "M,ZZZU1234567,2,0,0,0,0,1",
            "M,YYYU1234567,1,0,0,1,0,1",
            "U,XXXU1234567,0,0,0",
        ]
    );
    assert!(
        plan.instructions.len() < reloading.plan_port(None).instructions.len(),
        "整段移列应少于卸下重装的操作数"
    );
    assert_eq!(replay_issues(ship, None, &plan.instructions), 0);
}

#[test]
fn test_detach_run_splits_mixed_destinations() {
    let ship = ship_with(
        3,
        1,
        2,
        &[
            (at(0, 0, 0), "XXXU1234567", "AAAAA"),
            (at(1, 0, 0), "YYYU1234567", "BBBBB"),
            (at(2, 0, 0), "ZZZU1234567", "CCCCC"),
        ],
    );
    let mut planner = create_test_planner(StrategyKind::RunDetach, ship.clone());

    let plan = planner.plan_port(None);

    // 顶箱与下方目的港不同, 单独卸下; 其下的单箱段整段移列
    assert_eq!(
        lines(&plan.instructions),
        vec![
            "U,ZZZU1234567,2,0,0",
            "M,YYYU1234567,1,0,0,0,0,1",
            "U,XXXU1234567,0,0,0",
            "L,ZZZU1234567,0,0,0",
        ]
    );
    assert_eq!(replay_issues(ship, None, &plan.instructions), 0);
}

// 单列船无处移列, 退回原列复位
#[test]
fn test_detach_run_restacks_in_same_column() {
    let ship = ship_with(
        3,
        1,
        1,
        &[
            (at(0, 0, 0), "XXXU1234567", "AAAAA"),
            (at(1, 0, 0), "YYYU1234567", "CCCCC"),
            (at(2, 0, 0), "ZZZU1234567", "CCCCC"),
        ],
    );
    let mut planner = create_test_planner(StrategyKind::RunDetach, ship.clone());

    let plan = planner.plan_port(None);

    assert_eq!(
        lines(&plan.instructions),
        vec![
            "U,ZZZU1234567,2,0,0",
            "U,YYYU1234567,1,0,0",
            "U,XXXU1234567,0,0,0",
            "L,YYYU1234567,0,0,0",
            "L,ZZZU1234567,1,0,0",
        ]
    );
    assert_eq!(replay_issues(ship, None, &plan.instructions), 0);
}

// ==========================================
// 拒装与装箱
// ==========================================

#[test]
fn test_intake_rejections_precede_loads() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "BADID,100,BBBBB\n\
         CURU1234567,100,AAAAA\n\
         OUTU1234567,100,ZZZZZ\n\
         DUPU1234567,100,CCCCC\n\
         DUPU1234567,100,CCCCC\n\
         OKKU1234567,100,BBBBB\n",
    );
    let ship = ShipPlan::new(2, 2, 2);
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ship.clone());

    let plan = planner.plan_port(Some(&manifest));

    let kinds: Vec<InstructionKind> = plan.instructions.iter().map(|i| i.kind()).collect();
    let first_load = kinds.iter().position(|k| *k == InstructionKind::Load).unwrap();
    assert_eq!(first_load, 4, "四条拒装 (含一份重复副本) 应先于装箱");
    assert!(kinds[first_load..].iter().all(|k| *k == InstructionKind::Load));

    // 近港优先: BBBBB 先于 CCCCC
    assert_eq!(plan.instructions[4].container_id(), "OKKU1234567");
    assert_eq!(plan.instructions[5].container_id(), "DUPU1234567");

    assert!(plan.reported.contains(DiagnosticCode::ManifestIllegalId));
    assert!(plan.reported.contains(DiagnosticCode::ManifestDuplicateOnPort));
    assert!(!plan.reported.contains(DiagnosticCode::ManifestExceedsCapacity));
    assert_eq!(replay_issues(ship, Some(manifest), &plan.instructions), 0);
}

#[test]
fn test_full_ship_rejects_farthest_and_reports_capacity() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "FARU1234567,100,CCCCC\nNEAU1234567,100,BBBBB\n");
    let ship = ShipPlan::new(1, 1, 1);
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ship.clone());

    let plan = planner.plan_port(Some(&manifest));

    assert_eq!(
        lines(&plan.instructions),
        vec!["L,NEAU1234567,0,0,0", "R,FARU1234567,-1,-1,-1"]
    );
    assert!(plan.reported.contains(DiagnosticCode::ManifestExceedsCapacity));
    assert_eq!(replay_issues(ship, Some(manifest), &plan.instructions), 0);
}

#[test]
fn test_pending_reload_keeps_its_spot() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "NEWU1234567,100,BBBBB\n");
    let ship = ship_with(
        2,
        1,
        1,
        &[(at(0, 0, 0), "XXXU1234567", "AAAAA"), (at(1, 0, 0), "YYYU1234567", "CCCCC")],
    );
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ship.clone());

    let plan = planner.plan_port(Some(&manifest));

    // 新箱距离更近, 排在阻挡箱之前装船, 阻挡箱仍有位置
    let reloaded = plan
        .instructions
        .iter()
        .any(|i| i.kind() == InstructionKind::Load && i.container_id() == "YYYU1234567");
    assert!(reloaded, "阻挡箱应被重新装船");
    assert_eq!(planner.ship().map(|s| s.free_spots()), Some(0));
    assert_eq!(replay_issues(ship, Some(manifest), &plan.instructions), 0);
}

#[test]
fn test_balance_rejected_spot_is_skipped() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "AAAU1234567,100,BBBBB\n");
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ShipPlan::new(1, 1, 2));
    planner.set_balance_policy(Box::new(FnBalancePolicy(|op, _w, _x, y| {
        if op == BalanceOperation::Load && y == 0 {
            BalanceVerdict::Rejected
        } else {
            BalanceVerdict::Approved
        }
    })));

    let plan = planner.plan_port(Some(&manifest));

    assert_eq!(lines(&plan.instructions), vec!["L,AAAU1234567,0,0,1"]);
    let ship = planner.ship().unwrap();
    let spot = ship.spot(at(0, 0, 0)).unwrap();
    assert!(spot.is_available(), "配重排除不应改变箱位的结构可用性");
}

#[test]
fn test_same_destination_stacking() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "NEWU1234567,100,CCCCC\n");
    let ship = ship_with(2, 1, 2, &[(at(0, 0, 1), "OLDU1234567", "CCCCC")]);

    let mut naive = create_test_planner(StrategyKind::NaiveScan, ship.clone());
    let mut stacking = create_test_planner(StrategyKind::SameDestStack, ship);

    assert_eq!(lines(&naive.plan_port(Some(&manifest)).instructions), vec!["L,NEWU1234567,0,0,0"]);
    assert_eq!(
        lines(&stacking.plan_port(Some(&manifest)).instructions),
        vec!["L,NEWU1234567,1,0,1"]
    );
}

#[test]
fn test_reverse_scan_loads_nearest_first_from_last_column() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "FARU1234567,100,CCCCC\nNEAU1234567,100,BBBBB\n");
    let mut planner = create_test_planner(StrategyKind::ReverseScan, ShipPlan::new(1, 1, 2));

    let plan = planner.plan_port(Some(&manifest));

    assert_eq!(
        lines(&plan.instructions),
        vec!["L,NEAU1234567,0,0,1", "L,FARU1234567,0,0,0"]
    );
}

#[test]
fn test_reverse_scan_full_ship_rejection_is_fair() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "FARU1234567,100,CCCCC\nNEAU1234567,100,BBBBB\n");
    let mut planner = create_test_planner(StrategyKind::ReverseScan, ShipPlan::new(1, 1, 1));

    let plan = planner.plan_port(Some(&manifest));

    assert_eq!(
        lines(&plan.instructions),
        vec!["L,NEAU1234567,0,0,0", "R,FARU1234567,-1,-1,-1"],
        "船满时应拒装远港箱"
    );
    assert_eq!(
        replay_issues(ShipPlan::new(1, 1, 1), Some(manifest), &plan.instructions),
        0
    );
}

#[test]
fn test_no_floating_containers_after_planning() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        "AAAU1234567,100,BBBBB\nBBBU1234567,100,CCCCC\nCCCU1234567,100,BBBBB\n",
    );

    for kind in StrategyKind::ALL {
        let mut planner = create_test_planner(kind, ShipPlan::new(3, 1, 2));
        planner.plan_port(Some(&manifest));
        let ship = planner.ship().unwrap();
        for spot in ship.spots().filter(|s| s.is_occupied()) {
            assert!(ship.is_supported(spot.index()), "{} 产生了悬空箱 {}", kind.as_str(), spot.index());
        }
        assert_eq!(ship.aboard_count(), 3);
    }
}

// ==========================================
// 边界情况
// ==========================================

#[test]
fn test_plan_without_state_returns_empty_plan() {
    let mut planner = PortPlanner::from_definition(
        &StrategyKind::NaiveScan.definition(),
        PlannerSettings::default(),
    );

    let plan = planner.plan_port(None);

    assert!(plan.instructions.is_empty());
    assert_eq!(planner.phase(), PlanPhase::Idle);
}

#[test]
fn test_plan_past_route_end_returns_empty_plan() {
    let mut planner = create_test_planner(StrategyKind::NaiveScan, ShipPlan::new(1, 1, 1));
    for _ in 0..ROUTE.len() {
        planner.plan_port(None);
    }

    let plan = planner.plan_port(None);

    assert!(plan.instructions.is_empty());
    assert!(plan.reported.is_empty());
}
