// ==========================================
// 酒店前台预订系统 - 区间冲突核心 纯函数库
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 2. 区间冲突判定
// 职责: 提供预订时间窗与既有预订有效区间的冲突判定
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// BookedInterval - 既有预订的占用区间
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub reservation_id: String,      // 关联预订 (用于可解释性)
    pub check_in_at: NaiveDateTime,  // 入住时间
    pub check_out_at: NaiveDateTime, // 退房时间
}

// ==========================================
// OverlapCore - 纯函数工具类
// ==========================================
pub struct OverlapCore;

impl OverlapCore {
    /// 计算既有预订的有效阻断终点
    ///
    /// # 规则
    /// - effective_end = check_out_at + buffer_hours
    /// - 清洁缓冲只追加在既有预订的终点上,不追加在候选窗口上,
    ///   因此新预订可以恰好从 checkout + buffer 开始
    pub fn effective_end(interval: &BookedInterval, buffer_hours: i64) -> NaiveDateTime {
        interval.check_out_at + Duration::hours(buffer_hours)
    }

    /// 判定候选窗口与单个既有区间是否冲突
    ///
    /// # 规则
    /// - 半开区间判定: candidate_start < effective_end AND candidate_end > existing_start
    /// - 端点相接不算冲突
    pub fn overlaps(
        candidate_start: NaiveDateTime,
        candidate_end: NaiveDateTime,
        existing: &BookedInterval,
        buffer_hours: i64,
    ) -> bool {
        candidate_start < Self::effective_end(existing, buffer_hours)
            && candidate_end > existing.check_in_at
    }

    /// 判定候选窗口与既有区间集合是否冲突
    ///
    /// # 参数
    /// - candidate_start / candidate_end: 候选时间窗
    /// - existing: 既有预订区间集合 (已按占用状态过滤)
    /// - buffer_hours: 清洁缓冲小时数
    pub fn conflicts(
        candidate_start: NaiveDateTime,
        candidate_end: NaiveDateTime,
        existing: &[BookedInterval],
        buffer_hours: i64,
    ) -> bool {
        existing
            .iter()
            .any(|iv| Self::overlaps(candidate_start, candidate_end, iv, buffer_hours))
    }

    /// 计算冲突区间中最晚的有效阻断终点（面向用户的"最早可订时间"）
    ///
    /// # 返回
    /// - Some(ready_at): 存在冲突,返回冲突区间里最大的 effective_end
    /// - None: 无冲突
    pub fn conflicting_ready_time(
        candidate_start: NaiveDateTime,
        candidate_end: NaiveDateTime,
        existing: &[BookedInterval],
        buffer_hours: i64,
    ) -> Option<NaiveDateTime> {
        existing
            .iter()
            .filter(|iv| Self::overlaps(candidate_start, candidate_end, iv, buffer_hours))
            .map(|iv| Self::effective_end(iv, buffer_hours))
            .max()
    }

    /// 计算区间集合整体的释放时间
    ///
    /// # 规则
    /// - next_free = max(effective_end),集合为空时返回 None
    pub fn next_free_time(
        existing: &[BookedInterval],
        buffer_hours: i64,
    ) -> Option<NaiveDateTime> {
        existing
            .iter()
            .map(|iv| Self::effective_end(iv, buffer_hours))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn interval(check_in: NaiveDateTime, check_out: NaiveDateTime) -> BookedInterval {
        BookedInterval {
            reservation_id: "R001".to_string(),
            check_in_at: check_in,
            check_out_at: check_out,
        }
    }

    // ==========================================
    // 测试 1: 缓冲期边界
    // ==========================================

    #[test]
    fn test_candidate_starting_exactly_at_buffer_end_does_not_conflict() {
        // 既有预订: 6/1 14:00 → 6/2 12:00,缓冲3小时 ⇒ 阻断至 6/2 15:00
        let existing = vec![interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0))];

        // 恰好从 15:00 开始: 不冲突
        assert!(!OverlapCore::conflicts(
            dt(2024, 6, 2, 15, 0),
            dt(2024, 6, 2, 17, 0),
            &existing,
            3
        ));
    }

    #[test]
    fn test_candidate_starting_one_second_early_conflicts() {
        let existing = vec![interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0))];

        let start = dt(2024, 6, 2, 15, 0) - Duration::seconds(1);
        assert!(OverlapCore::conflicts(
            start,
            dt(2024, 6, 2, 17, 0),
            &existing,
            3
        ));
    }

    #[test]
    fn test_candidate_within_buffer_window_conflicts_with_ready_time() {
        // 6/2 14:00–16:00 落在缓冲期内,拒绝并给出 15:00 的可订时间
        let existing = vec![interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0))];

        let ready = OverlapCore::conflicting_ready_time(
            dt(2024, 6, 2, 14, 0),
            dt(2024, 6, 2, 16, 0),
            &existing,
            3,
        );
        assert_eq!(ready, Some(dt(2024, 6, 2, 15, 0)));
    }

    // ==========================================
    // 测试 2: 端点相接
    // ==========================================

    #[test]
    fn test_candidate_ending_at_existing_start_does_not_conflict() {
        let existing = vec![interval(dt(2024, 6, 3, 14, 0), dt(2024, 6, 4, 12, 0))];

        // 候选正好在既有预订开始时结束
        assert!(!OverlapCore::conflicts(
            dt(2024, 6, 3, 10, 0),
            dt(2024, 6, 3, 14, 0),
            &existing,
            3
        ));
    }

    #[test]
    fn test_candidate_ending_after_existing_start_conflicts() {
        let existing = vec![interval(dt(2024, 6, 3, 14, 0), dt(2024, 6, 4, 12, 0))];

        assert!(OverlapCore::conflicts(
            dt(2024, 6, 3, 10, 0),
            dt(2024, 6, 3, 14, 1),
            &existing,
            3
        ));
    }

    // ==========================================
    // 测试 3: 多区间取最大释放时间
    // ==========================================

    #[test]
    fn test_ready_time_is_max_effective_end_among_conflicts() {
        let existing = vec![
            interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0)), // 阻断至 6/2 15:00
            interval(dt(2024, 6, 2, 16, 0), dt(2024, 6, 3, 12, 0)), // 阻断至 6/3 15:00
        ];

        // 候选横跨两个区间,ready_time 取更晚者
        let ready = OverlapCore::conflicting_ready_time(
            dt(2024, 6, 2, 11, 0),
            dt(2024, 6, 3, 11, 0),
            &existing,
            3,
        );
        assert_eq!(ready, Some(dt(2024, 6, 3, 15, 0)));
    }

    #[test]
    fn test_ready_time_ignores_non_conflicting_intervals() {
        let existing = vec![
            interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0)), // 冲突
            interval(dt(2024, 6, 10, 14, 0), dt(2024, 6, 11, 12, 0)), // 远期,不冲突
        ];

        let ready = OverlapCore::conflicting_ready_time(
            dt(2024, 6, 2, 13, 0),
            dt(2024, 6, 2, 14, 0),
            &existing,
            3,
        );
        // 只取冲突区间的 effective_end,远期预订不参与
        assert_eq!(ready, Some(dt(2024, 6, 2, 15, 0)));
    }

    #[test]
    fn test_next_free_time_empty_set() {
        assert_eq!(OverlapCore::next_free_time(&[], 3), None);
    }

    #[test]
    fn test_zero_buffer() {
        let existing = vec![interval(dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0))];

        // 缓冲为0时,从 checkout 即可入住
        assert!(!OverlapCore::conflicts(
            dt(2024, 6, 2, 12, 0),
            dt(2024, 6, 2, 18, 0),
            &existing,
            0
        ));
    }
}

// ==========================================
// 属性测试: 与暴力逐分钟判定对照
// ==========================================
#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// 暴力参考实现: 逐分钟检查是否存在同时落在两个半开区间内的时间点
    fn brute_force_overlaps(
        cand_start_min: i64,
        cand_end_min: i64,
        exist_start_min: i64,
        exist_end_min: i64,
        buffer_hours: i64,
    ) -> bool {
        let blocked_end = exist_end_min + buffer_hours * 60;
        (cand_start_min..cand_end_min).any(|t| t >= exist_start_min && t < blocked_end)
    }

    proptest! {
        #[test]
        fn overlap_matches_brute_force(
            cand_start in 0i64..4000,
            cand_len in 1i64..2000,
            exist_start in 0i64..4000,
            exist_len in 1i64..2000,
            buffer in 0i64..6,
        ) {
            let cand_end = cand_start + cand_len;
            let exist_end = exist_start + exist_len;

            let existing = BookedInterval {
                reservation_id: "P".to_string(),
                check_in_at: base() + Duration::minutes(exist_start),
                check_out_at: base() + Duration::minutes(exist_end),
            };

            let fast = OverlapCore::overlaps(
                base() + Duration::minutes(cand_start),
                base() + Duration::minutes(cand_end),
                &existing,
                buffer,
            );
            let slow = brute_force_overlaps(cand_start, cand_end, exist_start, exist_end, buffer);

            prop_assert_eq!(fast, slow);
        }
    }
}
