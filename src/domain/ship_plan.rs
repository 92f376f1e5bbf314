// ==========================================
// 集装箱配载仿真系统 - 船舶箱位网格
// ==========================================
// 职责: 层 × 行 × 列 箱位状态、空位计数、箱号与目的港索引
// 红线: 一个箱位至多一个集装箱, 被占用的箱位必然可用
// 红线: 非底层的集装箱下方必须有箱或为结构不可用位 (禁止悬空)
// 红线: 插入/移除/移动与空位计数、索引同步更新, 不重新扫描
// ==========================================

use crate::domain::container::Container;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

// ==========================================
// SpotIndex - 箱位索引
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpotIndex {
    pub floor: usize,
    pub x: usize,
    pub y: usize,
}

impl SpotIndex {
    pub fn new(floor: usize, x: usize, y: usize) -> Self {
        Self { floor, x, y }
    }

    /// 同列正下方箱位
    pub fn below(&self) -> Option<SpotIndex> {
        self.floor
            .checked_sub(1)
            .map(|floor| SpotIndex::new(floor, self.x, self.y))
    }

    pub fn above(&self) -> SpotIndex {
        SpotIndex::new(self.floor + 1, self.x, self.y)
    }

    pub fn column(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

impl fmt::Display for SpotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.floor, self.x, self.y)
    }
}

// ==========================================
// Spot - 箱位
// ==========================================
#[derive(Debug, Clone)]
pub struct Spot {
    index: SpotIndex,
    available: bool,
    occupant: Option<Container>,
}

impl Spot {
    pub fn index(&self) -> SpotIndex {
        self.index
    }

    /// 结构可用（船型文件加载时确定）
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn occupant(&self) -> Option<&Container> {
        self.occupant.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// 可用且为空
    pub fn is_free(&self) -> bool {
        self.available && self.occupant.is_none()
    }
}

// ==========================================
// 箱位操作错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpotError {
    #[error("箱位超出范围: {0}")]
    OutOfRange(SpotIndex),

    #[error("箱位结构不可用: {0}")]
    Unavailable(SpotIndex),

    #[error("箱位已被占用: {0}")]
    Occupied(SpotIndex),

    #[error("箱位为空: {0}")]
    Empty(SpotIndex),

    #[error("箱位下方悬空: {0}")]
    Floating(SpotIndex),

    #[error("箱位上方有箱: {0}")]
    Blocked(SpotIndex),

    #[error("箱号已在船上: {0}")]
    DuplicateId(String),

    #[error("同列仅换层的移箱: {from} -> {to}")]
    SameColumn { from: SpotIndex, to: SpotIndex },

    #[error("该列已声明不可用层: ({x},{y})")]
    ColumnAlreadyDeclared { x: usize, y: usize },
}

// ==========================================
// ShipPlan - 船舶箱位网格
// ==========================================
#[derive(Debug, Clone)]
pub struct ShipPlan {
    decks: usize,
    rows: usize,
    cols: usize,

    /// 箱位网格（按 floor → x → y 展平）
    spots: Vec<Spot>,

    /// 空位计数
    free_spots: usize,

    /// 每列结构不可用层数
    blocked_floors: HashMap<(usize, usize), usize>,

    /// 箱号 → 箱位
    positions: HashMap<String, SpotIndex>,

    /// 目的港 → 箱号集合
    by_destination: BTreeMap<String, BTreeSet<String>>,
}

impl ShipPlan {
    /// 创建空船（所有箱位可用）
    ///
    /// # 参数
    /// - decks: 层数
    /// - rows: 行数 (x 方向)
    /// - cols: 列数 (y 方向)
    pub fn new(decks: usize, rows: usize, cols: usize) -> Self {
        let mut spots = Vec::with_capacity(decks * rows * cols);
        for floor in 0..decks {
            for x in 0..rows {
                for y in 0..cols {
                    spots.push(Spot {
                        index: SpotIndex::new(floor, x, y),
                        available: true,
                        occupant: None,
                    });
                }
            }
        }

        Self {
            decks,
            rows,
            cols,
            spots,
            free_spots: decks * rows * cols,
            blocked_floors: HashMap::new(),
            positions: HashMap::new(),
            by_destination: BTreeMap::new(),
        }
    }

    pub fn decks(&self) -> usize {
        self.decks
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    // ==========================================
    // 范围与箱位访问
    // ==========================================

    pub fn spot_in_range(&self, x: usize, y: usize) -> bool {
        x < self.rows && y < self.cols
    }

    pub fn index_in_range(&self, index: SpotIndex) -> bool {
        index.floor < self.decks && self.spot_in_range(index.x, index.y)
    }

    fn offset(&self, index: SpotIndex) -> Option<usize> {
        if !self.index_in_range(index) {
            return None;
        }
        Some((index.floor * self.rows + index.x) * self.cols + index.y)
    }

    pub fn spot(&self, index: SpotIndex) -> Option<&Spot> {
        self.offset(index).map(|i| &self.spots[i])
    }

    pub fn spots(&self) -> impl Iterator<Item = &Spot> {
        self.spots.iter()
    }

    /// 列内箱位（自底向上）
    pub fn column(&self, x: usize, y: usize) -> impl Iterator<Item = &Spot> + '_ {
        (0..self.decks).filter_map(move |floor| self.spot(SpotIndex::new(floor, x, y)))
    }

    pub fn container_at(&self, index: SpotIndex) -> Option<&Container> {
        self.spot(index).and_then(|s| s.occupant())
    }

    // ==========================================
    // 结构不可用层（仅船型加载阶段）
    // ==========================================

    /// 某列自底向上结构不可用的层数
    pub fn get_unavailable_floors_num(&self, x: usize, y: usize) -> usize {
        self.blocked_floors.get(&(x, y)).copied().unwrap_or(0)
    }

    /// 将某列底部 count 层标记为结构不可用
    ///
    /// # 返回
    /// - Err(ColumnAlreadyDeclared): 该列已声明过
    pub fn block_floors(&mut self, x: usize, y: usize, count: usize) -> Result<(), SpotError> {
        if !self.spot_in_range(x, y) {
            return Err(SpotError::OutOfRange(SpotIndex::new(0, x, y)));
        }
        if self.blocked_floors.contains_key(&(x, y)) {
            return Err(SpotError::ColumnAlreadyDeclared { x, y });
        }

        let count = count.min(self.decks);
        for floor in 0..count {
            let index = SpotIndex::new(floor, x, y);
            if let Some(offset) = self.offset(index) {
                let spot = &mut self.spots[offset];
                if spot.occupant.is_some() {
                    return Err(SpotError::Occupied(index));
                }
                if spot.available {
                    spot.available = false;
                    self.free_spots -= 1;
                }
            }
        }
        self.blocked_floors.insert((x, y), count);
        Ok(())
    }

    // ==========================================
    // 容量查询
    // ==========================================

    pub fn free_spots(&self) -> usize {
        self.free_spots
    }

    pub fn is_full(&self) -> bool {
        self.free_spots == 0
    }

    pub fn aboard_count(&self) -> usize {
        self.positions.len()
    }

    /// 结构可用箱位总数
    pub fn capacity(&self) -> usize {
        self.free_spots + self.positions.len()
    }

    // ==========================================
    // 箱号/目的港索引
    // ==========================================

    pub fn is_container_aboard(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.positions
            .get(id)
            .and_then(|index| self.container_at(*index))
    }

    /// 船上目的港为 destination 的集装箱（按箱号排序）
    pub fn containers_for_destination(&self, destination: &str) -> Vec<&Container> {
        self.by_destination
            .get(destination)
            .map(|ids| ids.iter().filter_map(|id| self.container(id)).collect())
            .unwrap_or_default()
    }

    pub fn has_containers_for(&self, destination: &str) -> bool {
        self.by_destination
            .get(destination)
            .map(|ids| !ids.is_empty())
            .unwrap_or(false)
    }

    // ==========================================
    // 堆叠规则查询
    // ==========================================

    /// 禁止悬空: 底层, 或下方有箱, 或下方为结构不可用位
    pub fn is_supported(&self, index: SpotIndex) -> bool {
        match index.below() {
            None => true,
            Some(below) => self
                .spot(below)
                .map(|s| s.is_occupied() || !s.is_available())
                .unwrap_or(false),
        }
    }

    pub fn has_container_above(&self, index: SpotIndex) -> bool {
        self.spot(index.above())
            .map(|s| s.is_occupied())
            .unwrap_or(false)
    }

    /// 合法装箱位: 可用、为空且不悬空
    pub fn is_legal_load_spot(&self, index: SpotIndex) -> bool {
        self.spot(index).map(|s| s.is_free()).unwrap_or(false) && self.is_supported(index)
    }

    /// 列内最低的合法装箱位
    pub fn get_first_free_spot_in(&self, x: usize, y: usize) -> Option<SpotIndex> {
        self.column(x, y)
            .map(|s| s.index())
            .find(|index| self.is_legal_load_spot(*index))
    }

    /// 列顶集装箱
    pub fn top_container(&self, x: usize, y: usize) -> Option<&Container> {
        self.column(x, y).filter_map(|s| s.occupant()).last()
    }

    /// 列内所有集装箱目的港相同则返回该目的港
    pub fn unique_destination_in_column(&self, x: usize, y: usize) -> Option<&str> {
        let mut dest: Option<&str> = None;
        for c in self.column(x, y).filter_map(|s| s.occupant()) {
            match dest {
                None => dest = Some(c.destination.as_str()),
                Some(d) if d == c.destination => {}
                Some(_) => return None,
            }
        }
        dest
    }

    /// 列内是否为空（无集装箱）
    pub fn is_column_empty(&self, x: usize, y: usize) -> bool {
        self.column(x, y).all(|s| !s.is_occupied())
    }

    // ==========================================
    // 箱位变更（与计数、索引同步）
    // ==========================================

    /// 将集装箱放入箱位
    pub fn insert_container(
        &mut self,
        index: SpotIndex,
        mut container: Container,
    ) -> Result<(), SpotError> {
        let offset = self.offset(index).ok_or(SpotError::OutOfRange(index))?;
        {
            let spot = &self.spots[offset];
            if !spot.available {
                return Err(SpotError::Unavailable(index));
            }
            if spot.occupant.is_some() {
                return Err(SpotError::Occupied(index));
            }
        }
        if self.positions.contains_key(&container.id) {
            return Err(SpotError::DuplicateId(container.id.clone()));
        }
        if !self.is_supported(index) {
            return Err(SpotError::Floating(index));
        }

        container.set_spot(Some(index));
        self.positions.insert(container.id.clone(), index);
        self.by_destination
            .entry(container.destination.clone())
            .or_default()
            .insert(container.id.clone());
        self.spots[offset].occupant = Some(container);
        self.free_spots -= 1;
        Ok(())
    }

    /// 从箱位移除集装箱（上方不得有箱）
    pub fn remove_container(&mut self, index: SpotIndex) -> Result<Container, SpotError> {
        let offset = self.offset(index).ok_or(SpotError::OutOfRange(index))?;
        if self.spots[offset].occupant.is_none() {
            return Err(SpotError::Empty(index));
        }
        if self.has_container_above(index) {
            return Err(SpotError::Blocked(index));
        }

        let mut container = self.spots[offset]
            .occupant
            .take()
            .ok_or(SpotError::Empty(index))?;
        self.positions.remove(&container.id);
        if let Some(ids) = self.by_destination.get_mut(&container.destination) {
            ids.remove(&container.id);
            if ids.is_empty() {
                self.by_destination.remove(&container.destination);
            }
        }
        self.free_spots += 1;
        container.set_spot(None);
        Ok(container)
    }

    /// 船内移箱（不允许同列仅换层）
    pub fn move_container(&mut self, from: SpotIndex, to: SpotIndex) -> Result<(), SpotError> {
        if !self.index_in_range(to) {
            return Err(SpotError::OutOfRange(to));
        }
        if from.column() == to.column() {
            return Err(SpotError::SameColumn { from, to });
        }
        if !self.is_legal_load_spot(to) {
            return match self.spot(to) {
                Some(s) if !s.is_available() => Err(SpotError::Unavailable(to)),
                Some(s) if s.is_occupied() => Err(SpotError::Occupied(to)),
                _ => Err(SpotError::Floating(to)),
            };
        }

        let container = self.remove_container(from)?;
        self.insert_container(to, container)
    }
}
