use chrono::Utc;
use dashboard_api::{
    db::{create_orm_conn, create_pool},
    dto::transactions::{CreateTransactionRequest, TransactionItem, UpdateTransactionRequest},
    entity::vouchers::{ActiveModel as VoucherActive, Entity as Vouchers},
    entity::users::ActiveModel as UserActive,
    middleware::auth::{CallerIdentity, RequestMeta},
    routes::transactions::TransactionListQuery,
    routes::params::ListParams,
    services::transaction_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: create sales with percentage, fixed and usage-limited
// vouchers, then exercise listing, update and delete.
#[tokio::test]
async fn transaction_and_voucher_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "buyer@example.com").await?;
    let caller = CallerIdentity {
        user_id,
        email: "buyer@example.com".into(),
    };
    let meta = RequestMeta::default();

    // Percentage voucher, capped.
    let pct = create_voucher(&state, "PCT10", "percentage", 10, Some(300), None).await?;
    let sale = transaction_service::create_transaction(
        &state,
        &caller,
        &meta,
        request(user_id, 10_000, 200, 500, Some("pct10".into())),
    )
    .await?;

    let today = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert_eq!(sale.transaction_number, format!("TRX{today}0001"));
    assert_eq!(sale.voucher_discount, 300, "10% of 10000 capped at 300");
    assert_eq!(sale.total, 10_000 - 200 - 300 + 500);
    assert_eq!(sale.voucher_code.as_deref(), Some("PCT10"));

    let pct = Vouchers::find_by_id(pct).one(&state.orm).await?.unwrap();
    assert_eq!(pct.used_count, 1);

    // Fixed voucher larger than the subtotal floors the total at zero.
    create_voucher(&state, "BIG", "fixed", 50_000, None, None).await?;
    let sale = transaction_service::create_transaction(
        &state,
        &caller,
        &meta,
        request(user_id, 10_000, 0, 0, Some("BIG".into())),
    )
    .await?;
    assert_eq!(sale.total, 0);
    assert_eq!(sale.transaction_number, format!("TRX{today}0002"));

    // Six concurrent redemptions against a limit of three: exactly three
    // sales get the discount, and the counter never overshoots.
    let lim = create_voucher(&state, "LIM3", "percentage", 10, None, Some(3)).await?;
    let mut handles = Vec::new();
    for _ in 0..6 {
        let state = state.clone();
        let caller = caller.clone();
        handles.push(tokio::spawn(async move {
            transaction_service::create_transaction(
                &state,
                &caller,
                &RequestMeta::default(),
                request(caller.user_id, 1000, 0, 0, Some("LIM3".into())),
            )
            .await
        }));
    }

    let mut discounted = 0;
    for handle in handles {
        let sale = handle.await??;
        if sale.voucher_discount > 0 {
            discounted += 1;
        }
    }
    assert_eq!(discounted, 3, "limit of 3 must cap concurrent redemptions");

    let lim = Vouchers::find_by_id(lim).one(&state.orm).await?.unwrap();
    assert_eq!(lim.used_count, 3);

    // Pagination envelope: 8 sales so far, 5 per page.
    let page = transaction_service::list_transactions(
        &state,
        TransactionListQuery {
            params: ListParams {
                page: Some(1),
                limit: Some(5),
                search: None,
            },
            user_id: Some(user_id),
            status: None,
            payment_status: None,
        },
    )
    .await?;
    assert_eq!(page.total_items, 8);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 5);

    // Lookup by number round-trips.
    let found = transaction_service::get_transaction_by_number(
        &state,
        &format!("TRX{today}0001"),
    )
    .await?;
    assert_eq!(found.voucher_code.as_deref(), Some("PCT10"));

    // Status transitions persist; pricing fields stay untouched.
    let updated = transaction_service::update_transaction(
        &state,
        &caller,
        &meta,
        found.id,
        UpdateTransactionRequest {
            status: Some("completed".into()),
            payment_status: Some("paid".into()),
            notes: None,
        },
    )
    .await?;
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.total, found.total);

    transaction_service::delete_transaction(&state, &caller, &meta, found.id).await?;
    let err = transaction_service::get_transaction(&state, found.id).await;
    assert!(err.is_err(), "deleted transaction must not resolve");

    Ok(())
}

fn request(
    user_id: Uuid,
    subtotal: i64,
    discount_amount: i64,
    tax: i64,
    voucher_code: Option<String>,
) -> CreateTransactionRequest {
    CreateTransactionRequest {
        user_id,
        items: vec![TransactionItem {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            price: subtotal,
            quantity: 1,
        }],
        subtotal,
        discount_amount,
        voucher_code,
        tax,
        payment_method: None,
        notes: None,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE transactions, transaction_counters, vouchers, activity_logs, users CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        upload_dir: std::env::temp_dir(),
    })
}

async fn create_user(state: &AppState, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Buyer".into()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        status: Set("active".into()),
        phone: Set(None),
        avatar: Set(None),
        last_login: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_voucher(
    state: &AppState,
    code: &str,
    discount_type: &str,
    discount_value: i64,
    max_discount: Option<i64>,
    usage_limit: Option<i32>,
) -> anyhow::Result<Uuid> {
    let voucher = VoucherActive {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set(code.to_string()),
        description: Set(None),
        discount_type: Set(discount_type.to_string()),
        discount_value: Set(discount_value),
        min_purchase: Set(0),
        max_discount: Set(max_discount),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        start_date: Set(None),
        end_date: Set(None),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(voucher.id)
}
