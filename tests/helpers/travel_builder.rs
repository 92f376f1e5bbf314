// ==========================================
// 航次目录构建器 - 用于集成测试
// ==========================================
// 职责: 在临时目录下写出船型 / 航线 / 舱单文件
// ==========================================

use std::fs;
use std::path::{Path, PathBuf};

/// 航次目录构建器
#[derive(Debug, Clone)]
pub struct TravelBuilder {
    name: String,
    plan: Vec<String>,
    route: Vec<String>,
    cargo: Vec<(String, String)>,
}

impl TravelBuilder {
    /// 创建新的构建器
    ///
    /// # 参数
    /// - name: 航次目录名
    /// - decks / rows / cols: 船型尺寸
    pub fn new(name: &str, decks: usize, rows: usize, cols: usize) -> Self {
        Self {
            name: name.to_string(),
            plan: vec![format!("{},{},{}", decks, rows, cols)],
            route: Vec::new(),
            cargo: Vec::new(),
        }
    }

    /// 声明某列可用层数
    pub fn column(mut self, x: usize, y: usize, available_floors: usize) -> Self {
        self.plan.push(format!("{},{},{}", x, y, available_floors));
        self
    }

    pub fn route(mut self, ports: &[&str]) -> Self {
        self.route = ports.iter().map(|p| p.to_string()).collect();
        self
    }

    /// 添加一次挂靠的舱单
    ///
    /// # 参数
    /// - rows: (箱号, 重量, 目的港)
    pub fn cargo(mut self, port: &str, visit: usize, rows: &[(&str, u32, &str)]) -> Self {
        let content: String = rows
            .iter()
            .map(|(id, weight, dest)| format!("{},{},{}\n", id, weight, dest))
            .collect();
        self.cargo
            .push((format!("{}_{}.cargo_data", port, visit), content));
        self
    }

    /// 写入原始文件（用于构造非法输入）
    pub fn raw_file(mut self, file_name: &str, content: &str) -> Self {
        self.cargo.push((file_name.to_string(), content.to_string()));
        self
    }

    /// 写出航次目录
    ///
    /// # 返回
    /// 航次目录路径
    pub fn build(&self, root: &Path) -> PathBuf {
        let dir = root.join(&self.name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ship.ship_plan"), self.plan.join("\n") + "\n").unwrap();
        if !self.route.is_empty() {
            fs::write(dir.join("ship.route"), self.route.join("\n") + "\n").unwrap();
        }
        for (file, content) in &self.cargo {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }
}

/// 构建一个无冲突的四港航次
///
/// 船型 2 层 2×2, 全程在船箱数不超过 5
pub fn clean_four_port_travel(name: &str) -> TravelBuilder {
    TravelBuilder::new(name, 2, 2, 2)
        .route(&["AAAAA", "BBBBB", "CCCCC", "DDDDD"])
        .cargo(
            "AAAAA",
            1,
            &[
                ("ABCU1000001", 1200, "BBBBB"),
                ("ABCU1000002", 900, "CCCCC"),
                ("ABCU1000003", 1500, "DDDDD"),
                ("ABCU1000004", 800, "CCCCC"),
            ],
        )
        .cargo(
            "BBBBB",
            1,
            &[("BCDU2000001", 1000, "DDDDD"), ("BCDU2000002", 700, "DDDDD")],
        )
        .cargo("CCCCC", 1, &[("CDEU3000001", 600, "DDDDD")])
}
