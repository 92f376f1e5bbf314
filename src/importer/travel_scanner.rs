// ==========================================
// 集装箱配载仿真系统 - 航次目录扫描
// ==========================================
// 约定: 航次根目录下每个子目录为一个航次
//       航次目录内恰好一个 .ship_plan 与一个 .route
//       舱单文件命名 <港口代码>_<挂靠序号>.cargo_data
// ==========================================

use crate::domain::container::{is_valid_port_code, normalize_port_code};
use crate::domain::route::CargoFile;
use crate::domain::types::{CARGO_EXTENSION, ROUTE_EXTENSION, SHIP_PLAN_EXTENSION};
use crate::importer::error::{ImportError, ImportResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ==========================================
// TravelFiles - 单个航次的输入文件
// ==========================================
#[derive(Debug, Clone)]
pub struct TravelFiles {
    /// 航次名（目录名）
    pub name: String,
    pub dir: PathBuf,
    pub ship_plan: PathBuf,
    pub route: PathBuf,
    pub cargo_files: Vec<CargoFile>,

    /// 无法识别的文件（含命名不规范的舱单）
    pub ignored_files: Vec<PathBuf>,
}

/// 列出航次根目录下的航次目录（按名称排序）
pub fn list_travel_dirs(root: &Path) -> ImportResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ImportError::TravelDirNotFound(root.display().to_string()));
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    debug!(root = %root.display(), travels = dirs.len(), "航次目录扫描完成");
    Ok(dirs)
}

impl TravelFiles {
    /// 识别航次目录内的文件
    ///
    /// # 返回
    /// - Err(MissingTravelFile / DuplicateTravelFile): 船型或航线文件缺失/重复
    pub fn locate(dir: &Path) -> ImportResult<Self> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string());

        let mut plans = Vec::new();
        let mut routes = Vec::new();
        let mut cargo_files = Vec::new();
        let mut ignored_files = Vec::new();

        let mut entries: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                entries.push(path);
            }
        }
        entries.sort();

        for path in entries {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            match extension.as_str() {
                SHIP_PLAN_EXTENSION => plans.push(path),
                ROUTE_EXTENSION => routes.push(path),
                CARGO_EXTENSION => match parse_cargo_file_name(&path) {
                    Some(cargo) => cargo_files.push(cargo),
                    None => {
                        warn!(travel = %name, file = %path.display(), "舱单文件命名不规范, 忽略");
                        ignored_files.push(path);
                    }
                },
                _ => ignored_files.push(path),
            }
        }

        let ship_plan = single_file(&name, SHIP_PLAN_EXTENSION, plans)?;
        let route = single_file(&name, ROUTE_EXTENSION, routes)?;

        Ok(Self {
            name,
            dir: dir.to_path_buf(),
            ship_plan,
            route,
            cargo_files,
            ignored_files,
        })
    }
}

fn single_file(travel: &str, kind: &str, mut files: Vec<PathBuf>) -> ImportResult<PathBuf> {
    match files.len() {
        0 => Err(ImportError::MissingTravelFile {
            travel: travel.to_string(),
            kind: kind.to_string(),
        }),
        1 => Ok(files.remove(0)),
        _ => Err(ImportError::DuplicateTravelFile {
            travel: travel.to_string(),
            kind: kind.to_string(),
        }),
    }
}

/// 解析舱单文件名 <港口代码>_<挂靠序号>.cargo_data
///
/// 挂靠序号为不含前导零的正整数
pub fn parse_cargo_file_name(path: &Path) -> Option<CargoFile> {
    if path.extension()?.to_str()? != CARGO_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (port, visit) = stem.split_once('_')?;

    if !is_valid_port_code(port) {
        return None;
    }
    if visit.is_empty() || visit.starts_with('0') || !visit.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(CargoFile {
        port: normalize_port_code(port),
        visit: visit.parse().ok()?,
        path: path.to_path_buf(),
    })
}
