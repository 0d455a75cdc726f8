use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};

use crate::{
    entity::vouchers::{Column, Entity as Vouchers, Model as VoucherModel},
    error::AppResult,
};

/// Why a voucher cannot be applied to a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherRejection {
    NotFound,
    Inactive,
    NotYetValid,
    Expired,
    LimitReached,
    BelowMinimum,
}

impl VoucherRejection {
    pub fn message(&self) -> &'static str {
        match self {
            VoucherRejection::NotFound => "Voucher not found",
            VoucherRejection::Inactive => "Voucher is not active",
            VoucherRejection::NotYetValid => "Voucher is not yet valid",
            VoucherRejection::Expired => "Voucher has expired",
            VoucherRejection::LimitReached => "Voucher usage limit reached",
            VoucherRejection::BelowMinimum => "Purchase amount below voucher minimum",
        }
    }
}

/// Status, validity window and usage-limit checks shared by the
/// read-only lookup and the redemption path.
pub fn check_validity(voucher: &VoucherModel, now: DateTime<Utc>) -> Result<(), VoucherRejection> {
    if voucher.status != "active" {
        return Err(VoucherRejection::Inactive);
    }
    if let Some(start) = voucher.start_date {
        if start > now {
            return Err(VoucherRejection::NotYetValid);
        }
    }
    if let Some(end) = voucher.end_date {
        if end < now {
            return Err(VoucherRejection::Expired);
        }
    }
    if let Some(limit) = voucher.usage_limit {
        if voucher.used_count >= limit {
            return Err(VoucherRejection::LimitReached);
        }
    }
    Ok(())
}

/// Computes the discount a voucher grants against a subtotal.
///
/// Percentage vouchers are capped at `max_discount` when one is set;
/// fixed vouchers pass their value through uncapped — the transaction
/// engine floors the final total at zero.
pub fn evaluate(
    voucher: &VoucherModel,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<i64, VoucherRejection> {
    check_validity(voucher, now)?;

    if subtotal < voucher.min_purchase {
        return Err(VoucherRejection::BelowMinimum);
    }

    let discount = match voucher.discount_type.as_str() {
        "percentage" => {
            let raw = subtotal * voucher.discount_value / 100;
            match voucher.max_discount {
                Some(cap) if raw > cap => cap,
                _ => raw,
            }
        }
        _ => voucher.discount_value,
    };

    Ok(discount)
}

/// Redemption path: evaluates the voucher and, when applicable,
/// increments `used_count` with a conditional update so that
/// concurrent redemptions can never push past the usage limit.
///
/// Must run on the transaction that also inserts the sale, so the
/// increment rolls back with it.
pub async fn redeem<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    subtotal: i64,
) -> AppResult<Result<i64, VoucherRejection>> {
    let code = code.to_uppercase();
    let voucher = Vouchers::find()
        .filter(Column::Code.eq(&code))
        .one(conn)
        .await?;
    let voucher = match voucher {
        Some(v) => v,
        None => return Ok(Err(VoucherRejection::NotFound)),
    };

    let discount = match evaluate(&voucher, subtotal, Utc::now()) {
        Ok(d) => d,
        Err(reason) => return Ok(Err(reason)),
    };

    let result = Vouchers::update_many()
        .col_expr(Column::UsedCount, Expr::col(Column::UsedCount).add(1))
        .filter(Column::Id.eq(voucher.id))
        .filter(
            Condition::any()
                .add(Column::UsageLimit.is_null())
                .add(Expr::col(Column::UsedCount).lt(Expr::col(Column::UsageLimit))),
        )
        .exec(conn)
        .await?;

    // Zero rows means another redemption raced us to the last slot.
    if result.rows_affected == 0 {
        return Ok(Err(VoucherRejection::LimitReached));
    }

    Ok(Ok(discount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn voucher(discount_type: &str, discount_value: i64) -> VoucherModel {
        let now = Utc::now().fixed_offset();
        VoucherModel {
            id: Uuid::new_v4(),
            code: "SAVE10".into(),
            name: "Save".into(),
            description: None,
            discount_type: discount_type.into(),
            discount_value,
            min_purchase: 0,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            start_date: None,
            end_date: None,
            status: "active".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_discount_is_proportional() {
        let v = voucher("percentage", 10);
        assert_eq!(evaluate(&v, 1000, Utc::now()), Ok(100));
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let mut v = voucher("percentage", 50);
        v.max_discount = Some(300);
        assert_eq!(evaluate(&v, 1000, Utc::now()), Ok(300));
    }

    #[test]
    fn percentage_below_cap_is_untouched() {
        let mut v = voucher("percentage", 10);
        v.max_discount = Some(300);
        assert_eq!(evaluate(&v, 1000, Utc::now()), Ok(100));
    }

    #[test]
    fn fixed_discount_passes_through_uncapped() {
        let v = voucher("fixed", 20_000);
        assert_eq!(evaluate(&v, 10_000, Utc::now()), Ok(20_000));
    }

    #[test]
    fn inactive_voucher_is_rejected() {
        let mut v = voucher("percentage", 10);
        v.status = "inactive".into();
        assert_eq!(evaluate(&v, 1000, Utc::now()), Err(VoucherRejection::Inactive));
    }

    #[test]
    fn window_bounds_are_inclusive_of_open_ends() {
        let now = Utc::now();
        let mut v = voucher("percentage", 10);
        v.start_date = Some((now + Duration::hours(1)).fixed_offset());
        assert_eq!(evaluate(&v, 1000, now), Err(VoucherRejection::NotYetValid));

        let mut v = voucher("percentage", 10);
        v.end_date = Some((now - Duration::hours(1)).fixed_offset());
        assert_eq!(evaluate(&v, 1000, now), Err(VoucherRejection::Expired));

        let mut v = voucher("percentage", 10);
        v.start_date = Some((now - Duration::hours(1)).fixed_offset());
        v.end_date = Some((now + Duration::hours(1)).fixed_offset());
        assert_eq!(evaluate(&v, 1000, now), Ok(100));
    }

    #[test]
    fn exhausted_voucher_is_rejected() {
        let mut v = voucher("percentage", 10);
        v.usage_limit = Some(5);
        v.used_count = 5;
        assert_eq!(
            evaluate(&v, 1000, Utc::now()),
            Err(VoucherRejection::LimitReached)
        );
    }

    #[test]
    fn subtotal_below_minimum_is_rejected() {
        let mut v = voucher("percentage", 10);
        v.min_purchase = 5000;
        assert_eq!(
            evaluate(&v, 1000, Utc::now()),
            Err(VoucherRejection::BelowMinimum)
        );
        assert_eq!(evaluate(&v, 5000, Utc::now()), Ok(500));
    }
}
