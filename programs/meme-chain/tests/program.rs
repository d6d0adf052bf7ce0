use anchor_lang::{
    prelude::Pubkey,
    solana_program::{
        account_info::AccountInfo, entrypoint::ProgramResult, instruction::Instruction,
        native_token::LAMPORTS_PER_SOL, program_option::COption, sysvar,
    },
    AccountDeserialize, // for try_deserialize
    InstructionData,    // for .data()
    ToAccountMetas,     // for .to_account_metas()
};
use anchor_spl::associated_token::{self, get_associated_token_address};
use anchor_spl::token::{self, Mint, TokenAccount};
use meme_chain::constants::*;
use meme_chain::errors::MemeChainError;
use meme_chain::instructions::FirstBuy;
use meme_chain::state::{MemeToken, Protocol, ProtocolUpdate, WalletPurchase};
use solana_program_test::{
    processor, tokio, BanksClientError, ProgramTest, ProgramTestContext,
};
use solana_sdk::{
    account::Account,
    instruction::InstructionError,
    signature::Keypair,
    signer::Signer,
    system_program,
    transaction::{Transaction, TransactionError},
};

const PLATFORM_FEE_BPS: u16 = 100;
const CREATOR_FEE_BPS: u16 = 50;

// The generated entrypoint ties the slice and account lifetimes together,
// the test processor hands them out separately.
fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let accounts = Box::leak(Box::new(accounts.to_vec()));
    meme_chain::entry(program_id, accounts, data)
}

struct SetUpTest {
    validator: ProgramTest,
    authority: Keypair,
    creator: Keypair,
    trader: Keypair,
    fee_recipient: Pubkey,
}

impl SetUpTest {
    fn new() -> Self {
        let mut validator = ProgramTest::new(
            "meme_chain",
            meme_chain::ID,
            processor!(process_instruction),
        );
        validator.set_compute_max_units(1_400_000);

        let authority = Keypair::new();
        let creator = Keypair::new();
        let trader = Keypair::new();
        for wallet in [&authority, &creator, &trader] {
            validator.add_account(
                wallet.pubkey(),
                Account {
                    lamports: 100 * LAMPORTS_PER_SOL,
                    ..Account::default()
                },
            );
        }

        // funded so that small fee transfers keep it rent exempt
        let fee_recipient = Pubkey::new_unique();
        validator.add_account(
            fee_recipient,
            Account {
                lamports: LAMPORTS_PER_SOL,
                ..Account::default()
            },
        );

        Self {
            validator,
            authority,
            creator,
            trader,
            fee_recipient,
        }
    }
}

struct MemeKeys {
    meme: Pubkey,
    mint: Pubkey,
    vault: Pubkey,
}

impl MemeKeys {
    fn derive(creator: &Pubkey, symbol: &str) -> Self {
        let (meme, _) = MemeToken::find_address(creator, symbol);
        let (mint, _) = MemeToken::find_mint_address(&meme);
        let (vault, _) = MemeToken::find_vault_address(&meme);
        Self { meme, mint, vault }
    }
}

/// Sends `instructions` with the context payer covering transaction fees.
async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        all_signers.as_slice(),
        context.last_blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

fn assert_program_error(result: Result<(), BanksClientError>, expected: MemeChainError) {
    let code = u32::from(expected);
    match result.unwrap_err().unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(actual)) => {
            assert_eq!(actual, code)
        }
        other => panic!("expected custom error {}, got {:?}", code, other),
    }
}

async fn lamports(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .map_or(0, |account| account.lamports)
}

async fn raw_data(context: &mut ProgramTestContext, address: Pubkey) -> Vec<u8> {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .unwrap()
        .data
}

async fn load_and_deserialize<T: AccountDeserialize>(
    context: &mut ProgramTestContext,
    address: Pubkey,
) -> T {
    let data = raw_data(context, address).await;
    T::try_deserialize(&mut data.as_slice()).unwrap()
}

async fn token_balance(context: &mut ProgramTestContext, owner: Pubkey, mint: Pubkey) -> u64 {
    let ata = get_associated_token_address(&owner, &mint);
    load_and_deserialize::<TokenAccount>(context, ata).await.amount
}

fn initialize_ix(authority: Pubkey, fee_recipient: Pubkey) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::InitializeProtocol {
            authority,
            protocol,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::InitializeProtocol {
            fee_recipient,
            platform_fee: PLATFORM_FEE_BPS,
            creator_fee: CREATOR_FEE_BPS,
        }
        .data(),
    }
}

fn update_ix(authority: Pubkey, update: ProtocolUpdate) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::UpdateProtocol {
            authority,
            protocol,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::UpdateProtocol { update }.data(),
    }
}

fn create_ix(
    creator: Pubkey,
    fee_recipient: Pubkey,
    symbol: &str,
    uri: &str,
    first_buy: Option<FirstBuy>,
) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    let keys = MemeKeys::derive(&creator, symbol);
    let (creator_purchase, _) = WalletPurchase::find_address(&keys.meme, &creator);
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::CreateMemeToken {
            creator,
            protocol,
            meme: keys.meme,
            mint: keys.mint,
            vault: keys.vault,
            creator_token_account: get_associated_token_address(&creator, &keys.mint),
            creator_purchase,
            fee_recipient,
            token_program: token::ID,
            associated_token_program: associated_token::ID,
            system_program: system_program::ID,
            rent: sysvar::rent::ID,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::CreateMemeToken {
            name: "Frog Coin".to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
            image_hash: [9; 32],
            initial_virtual_sol_reserves: DEFAULT_VIRTUAL_SOL_RESERVES,
            initial_virtual_token_reserves: DEFAULT_VIRTUAL_TOKEN_RESERVES,
            first_buy,
        }
        .data(),
    }
}

fn buy_ix(
    buyer: Pubkey,
    creator: Pubkey,
    fee_recipient: Pubkey,
    symbol: &str,
    token_amount: u64,
    max_sol_cost: u64,
) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    let keys = MemeKeys::derive(&creator, symbol);
    let (buyer_purchase, _) = WalletPurchase::find_address(&keys.meme, &buyer);
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::BuyTokens {
            buyer,
            protocol,
            meme: keys.meme,
            mint: keys.mint,
            vault: keys.vault,
            buyer_token_account: get_associated_token_address(&buyer, &keys.mint),
            buyer_purchase,
            fee_recipient,
            creator,
            token_program: token::ID,
            associated_token_program: associated_token::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::BuyTokens {
            token_amount,
            max_sol_cost,
        }
        .data(),
    }
}

fn sell_ix(
    seller: Pubkey,
    creator: Pubkey,
    fee_recipient: Pubkey,
    symbol: &str,
    token_amount: u64,
) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    let keys = MemeKeys::derive(&creator, symbol);
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::SellTokens {
            seller,
            protocol,
            meme: keys.meme,
            mint: keys.mint,
            vault: keys.vault,
            seller_token_account: get_associated_token_address(&seller, &keys.mint),
            fee_recipient,
            creator,
            token_program: token::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::SellTokens {
            token_amount,
            min_sol_out: 0,
            max_slippage_bps: 10_000,
        }
        .data(),
    }
}

fn withdraw_ix(authority: Pubkey, creator: Pubkey, symbol: &str) -> Instruction {
    let (protocol, _) = Protocol::find_address();
    let keys = MemeKeys::derive(&creator, symbol);
    Instruction {
        program_id: meme_chain::ID,
        accounts: meme_chain::accounts::WithdrawForMigration {
            authority,
            protocol,
            meme: keys.meme,
            mint: keys.mint,
            vault: keys.vault,
            authority_token_account: get_associated_token_address(&authority, &keys.mint),
            token_program: token::ID,
            associated_token_program: associated_token::ID,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: meme_chain::instruction::WithdrawForMigration {}.data(),
    }
}

#[tokio::test]
async fn test_create_funds_vault_and_rejects_second_create() {
    let SetUpTest {
        validator,
        authority,
        creator,
        fee_recipient,
        ..
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;
    let rent = context.banks_client.get_rent().await.unwrap();

    send(&mut context, &[initialize_ix(authority.pubkey(), fee_recipient)], &[&authority])
        .await
        .unwrap();
    send(
        &mut context,
        &[create_ix(creator.pubkey(), fee_recipient, "FROG", "ipfs://frog", None)],
        &[&creator],
    )
    .await
    .unwrap();

    let keys = MemeKeys::derive(&creator.pubkey(), "FROG");
    assert_eq!(lamports(&mut context, keys.vault).await, rent.minimum_balance(0));

    let meme: MemeToken = load_and_deserialize(&mut context, keys.meme).await;
    assert_eq!(meme.creator, creator.pubkey());
    assert_eq!(meme.mint, keys.mint);
    assert_eq!(meme.symbol(), "FROG");
    assert_eq!(meme.uri(), "ipfs://frog");
    assert_eq!(meme.real_sol_reserves, 0);

    let mint: Mint = load_and_deserialize(&mut context, keys.mint).await;
    assert_eq!(mint.decimals, TOKEN_DECIMALS);
    assert_eq!(mint.supply, 0);
    assert_eq!(mint.mint_authority, COption::Some(keys.meme));

    let (protocol_key, _) = Protocol::find_address();
    let protocol: Protocol = load_and_deserialize(&mut context, protocol_key).await;
    assert_eq!(protocol.total_memes_created, 1);

    let meme_before = raw_data(&mut context, keys.meme).await;
    let result = send(
        &mut context,
        &[create_ix(creator.pubkey(), fee_recipient, "FROG", "ipfs://other", None)],
        &[&creator],
    )
    .await;
    assert_program_error(result, MemeChainError::AlreadyExists);

    assert_eq!(raw_data(&mut context, keys.meme).await, meme_before);
    assert_eq!(lamports(&mut context, keys.vault).await, rent.minimum_balance(0));
    let protocol: Protocol = load_and_deserialize(&mut context, protocol_key).await;
    assert_eq!(protocol.total_memes_created, 1);
}

#[tokio::test]
async fn test_overlong_symbol_is_field_too_long() {
    let SetUpTest {
        validator,
        authority,
        creator,
        fee_recipient,
        ..
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;

    send(&mut context, &[initialize_ix(authority.pubkey(), fee_recipient)], &[&authority])
        .await
        .unwrap();

    // past the 32 byte seed limit, and just past the symbol capacity
    for symbol in ["S".repeat(40), "ABCDEFGHIJK".to_string()] {
        let result = send(
            &mut context,
            &[create_ix(creator.pubkey(), fee_recipient, &symbol, "", None)],
            &[&creator],
        )
        .await;
        assert_program_error(result, MemeChainError::FieldTooLong);

        let keys = MemeKeys::derive(&creator.pubkey(), &symbol);
        assert_eq!(lamports(&mut context, keys.meme).await, 0);
    }
}

#[tokio::test]
async fn test_buy_splits_payment_between_vault_fee_recipient_and_creator() {
    let SetUpTest {
        validator,
        authority,
        creator,
        trader,
        fee_recipient,
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;

    send(&mut context, &[initialize_ix(authority.pubkey(), fee_recipient)], &[&authority])
        .await
        .unwrap();
    send(
        &mut context,
        &[create_ix(creator.pubkey(), fee_recipient, "FROG", "", None)],
        &[&creator],
    )
    .await
    .unwrap();

    let keys = MemeKeys::derive(&creator.pubkey(), "FROG");
    let vault_before = lamports(&mut context, keys.vault).await;
    let fees_before = lamports(&mut context, fee_recipient).await;
    let creator_before = lamports(&mut context, creator.pubkey()).await;
    let trader_before = lamports(&mut context, trader.pubkey()).await;

    let amount = 10_730_000_000;
    let result = send(
        &mut context,
        &[buy_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount, 304_503)],
        &[&trader],
    )
    .await;
    assert_program_error(result, MemeChainError::SlippageExceeded);

    send(
        &mut context,
        &[buy_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount, 304_504)],
        &[&trader],
    )
    .await
    .unwrap();

    assert_eq!(lamports(&mut context, keys.vault).await - vault_before, 300_004);
    assert_eq!(lamports(&mut context, fee_recipient).await - fees_before, 3_000);
    assert_eq!(lamports(&mut context, creator.pubkey()).await - creator_before, 1_500);

    // the buyer also funded its token account and purchase record
    let ata = get_associated_token_address(&trader.pubkey(), &keys.mint);
    let (record_key, _) = WalletPurchase::find_address(&keys.meme, &trader.pubkey());
    let account_rent = lamports(&mut context, ata).await + lamports(&mut context, record_key).await;
    assert_eq!(
        trader_before - lamports(&mut context, trader.pubkey()).await,
        304_504 + account_rent
    );

    assert_eq!(token_balance(&mut context, trader.pubkey(), keys.mint).await, amount);
    let mint: Mint = load_and_deserialize(&mut context, keys.mint).await;
    assert_eq!(mint.supply, amount);

    let record: WalletPurchase = load_and_deserialize(&mut context, record_key).await;
    assert_eq!(record.wallet, trader.pubkey());
    assert_eq!(record.tokens_bought, amount);

    let meme: MemeToken = load_and_deserialize(&mut context, keys.meme).await;
    assert_eq!(meme.real_sol_reserves, 300_004);
    assert_eq!(meme.tokens_sold, amount);
}

#[tokio::test]
async fn test_creator_buys_without_creator_fee() {
    let SetUpTest {
        validator,
        authority,
        creator,
        fee_recipient,
        ..
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;
    let rent = context.banks_client.get_rent().await.unwrap();

    send(&mut context, &[initialize_ix(authority.pubkey(), fee_recipient)], &[&authority])
        .await
        .unwrap();

    // curve cost 300_004 plus the 3_000 platform fee
    let amount = 10_730_000_000;
    let result = send(
        &mut context,
        &[create_ix(
            creator.pubkey(),
            fee_recipient,
            "FROG",
            "",
            Some(FirstBuy {
                token_amount: amount,
                max_sol_cost: 303_003,
            }),
        )],
        &[&creator],
    )
    .await;
    assert_program_error(result, MemeChainError::SlippageExceeded);

    let fees_before = lamports(&mut context, fee_recipient).await;
    send(
        &mut context,
        &[create_ix(
            creator.pubkey(),
            fee_recipient,
            "FROG",
            "",
            Some(FirstBuy {
                token_amount: amount,
                max_sol_cost: 303_004,
            }),
        )],
        &[&creator],
    )
    .await
    .unwrap();

    let keys = MemeKeys::derive(&creator.pubkey(), "FROG");
    assert_eq!(
        lamports(&mut context, keys.vault).await,
        rent.minimum_balance(0) + 300_004
    );
    assert_eq!(lamports(&mut context, fee_recipient).await - fees_before, 3_000);
    assert_eq!(token_balance(&mut context, creator.pubkey(), keys.mint).await, amount);

    // through buy_tokens: curve cost 300_010 plus the 3_000 platform fee
    let creator_before = lamports(&mut context, creator.pubkey()).await;
    let vault_before = lamports(&mut context, keys.vault).await;
    let fees_before = lamports(&mut context, fee_recipient).await;
    send(
        &mut context,
        &[buy_ix(creator.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount, 303_010)],
        &[&creator],
    )
    .await
    .unwrap();
    assert_eq!(
        creator_before - lamports(&mut context, creator.pubkey()).await,
        303_010
    );
    assert_eq!(lamports(&mut context, keys.vault).await - vault_before, 300_010);
    assert_eq!(lamports(&mut context, fee_recipient).await - fees_before, 3_000);
    assert_eq!(
        token_balance(&mut context, creator.pubkey(), keys.mint).await,
        2 * amount
    );

    let (record_key, _) = WalletPurchase::find_address(&keys.meme, &creator.pubkey());
    let record: WalletPurchase = load_and_deserialize(&mut context, record_key).await;
    assert_eq!(record.tokens_bought, 2 * amount);
}

#[tokio::test]
async fn test_sell_burns_and_vault_pays_out() {
    let SetUpTest {
        validator,
        authority,
        creator,
        trader,
        fee_recipient,
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;
    let rent = context.banks_client.get_rent().await.unwrap();

    send(&mut context, &[initialize_ix(authority.pubkey(), fee_recipient)], &[&authority])
        .await
        .unwrap();
    send(
        &mut context,
        &[create_ix(creator.pubkey(), fee_recipient, "FROG", "", None)],
        &[&creator],
    )
    .await
    .unwrap();

    let amount = 10_000_000_000_000;
    send(
        &mut context,
        &[buy_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount, u64::MAX)],
        &[&trader],
    )
    .await
    .unwrap();

    let keys = MemeKeys::derive(&creator.pubkey(), "FROG");
    assert_eq!(
        lamports(&mut context, keys.vault).await,
        rent.minimum_balance(0) + 282_220_132
    );

    let fees_before = lamports(&mut context, fee_recipient).await;
    let creator_before = lamports(&mut context, creator.pubkey()).await;
    let trader_before = lamports(&mut context, trader.pubkey()).await;

    let result = send(
        &mut context,
        &[sell_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount + 1)],
        &[&trader],
    )
    .await;
    assert_program_error(result, MemeChainError::InsufficientTokenBalance);

    send(
        &mut context,
        &[sell_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount)],
        &[&trader],
    )
    .await
    .unwrap();

    // proceeds 282_220_131, fees rounded down
    assert_eq!(
        lamports(&mut context, trader.pubkey()).await - trader_before,
        277_986_830
    );
    assert_eq!(lamports(&mut context, fee_recipient).await - fees_before, 2_822_201);
    assert_eq!(lamports(&mut context, creator.pubkey()).await - creator_before, 1_411_100);
    assert_eq!(
        lamports(&mut context, keys.vault).await,
        rent.minimum_balance(0) + 1
    );

    assert_eq!(token_balance(&mut context, trader.pubkey(), keys.mint).await, 0);
    let mint: Mint = load_and_deserialize(&mut context, keys.mint).await;
    assert_eq!(mint.supply, 0);

    let meme: MemeToken = load_and_deserialize(&mut context, keys.meme).await;
    assert_eq!(meme.real_sol_reserves, 1);
    assert_eq!(meme.tokens_sold, 0);
    assert_eq!(meme.virtual_token_reserves, DEFAULT_VIRTUAL_TOKEN_RESERVES);
}

#[tokio::test]
async fn test_graduated_reserves_withdrawn_for_migration() {
    let SetUpTest {
        validator,
        authority,
        creator,
        trader,
        fee_recipient,
    } = SetUpTest::new();
    let mut context = validator.start_with_context().await;
    let rent = context.banks_client.get_rent().await.unwrap();

    send(
        &mut context,
        &[
            initialize_ix(authority.pubkey(), fee_recipient),
            update_ix(
                authority.pubkey(),
                ProtocolUpdate {
                    launch_window: Some(0),
                    ..Default::default()
                },
            ),
        ],
        &[&authority],
    )
    .await
    .unwrap();
    send(
        &mut context,
        &[create_ix(creator.pubkey(), fee_recipient, "FROG", "", None)],
        &[&creator],
    )
    .await
    .unwrap();

    let keys = MemeKeys::derive(&creator.pubkey(), "FROG");
    let result = send(
        &mut context,
        &[withdraw_ix(authority.pubkey(), creator.pubkey(), "FROG")],
        &[&authority],
    )
    .await;
    assert_program_error(result, MemeChainError::NotGraduated);

    let amount = 799_000_000_000_000;
    send(
        &mut context,
        &[buy_ix(trader.pubkey(), creator.pubkey(), fee_recipient, "FROG", amount, 88_793_978_102)],
        &[&trader],
    )
    .await
    .unwrap();

    let meme: MemeToken = load_and_deserialize(&mut context, keys.meme).await;
    assert!(meme.is_graduated);
    assert_eq!(meme.real_sol_reserves, 87_481_751_825);

    let result = send(
        &mut context,
        &[buy_ix(creator.pubkey(), creator.pubkey(), fee_recipient, "FROG", 1_000_000, u64::MAX)],
        &[&creator],
    )
    .await;
    assert_program_error(result, MemeChainError::AlreadyGraduated);

    // only the protocol authority may withdraw
    let result = send(
        &mut context,
        &[withdraw_ix(trader.pubkey(), creator.pubkey(), "FROG")],
        &[&trader],
    )
    .await;
    assert_program_error(result, MemeChainError::Unauthorized);

    // same instruction as the rejected attempt above, so it needs a new blockhash
    context.get_new_latest_blockhash().await.unwrap();
    let authority_before = lamports(&mut context, authority.pubkey()).await;
    send(
        &mut context,
        &[withdraw_ix(authority.pubkey(), creator.pubkey(), "FROG")],
        &[&authority],
    )
    .await
    .unwrap();

    let authority_ata = get_associated_token_address(&authority.pubkey(), &keys.mint);
    let ata_rent = lamports(&mut context, authority_ata).await;
    assert_eq!(
        lamports(&mut context, authority.pubkey()).await + ata_rent - authority_before,
        87_481_751_825
    );
    assert_eq!(lamports(&mut context, keys.vault).await, rent.minimum_balance(0));
    assert_eq!(
        token_balance(&mut context, authority.pubkey(), keys.mint).await,
        TOTAL_SUPPLY - amount
    );

    let mint: Mint = load_and_deserialize(&mut context, keys.mint).await;
    assert_eq!(mint.supply, TOTAL_SUPPLY);
    assert!(mint.mint_authority.is_none());
    assert!(mint.freeze_authority.is_none());

    let meme: MemeToken = load_and_deserialize(&mut context, keys.meme).await;
    assert!(meme.is_migrated);
    assert_eq!(meme.real_sol_reserves, 0);
}
