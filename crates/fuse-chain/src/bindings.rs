//! Contract call encodings.
//!
//! Only the view methods the reconcilers read are declared.

use alloy::sol;

sol! {
    /// ERC-20 metadata.
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }

    /// Lending market token.
    interface ICToken {
        function underlying() external view returns (address);
        function name() external view returns (string);
        function symbol() external view returns (string);
        function comptroller() external view returns (address);
        function interestRateModel() external view returns (address);
        function reserveFactorMantissa() external view returns (uint256);
        function accrualBlockNumber() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function exchangeRateStored() external view returns (uint256);
        function borrowIndex() external view returns (uint256);
        function totalReserves() external view returns (uint256);
        function totalBorrows() external view returns (uint256);
        function getCash() external view returns (uint256);
        function borrowRatePerBlock() external view returns (uint256);
        function supplyRatePerBlock() external view returns (uint256);
    }

    /// Pool controller.
    interface IComptroller {
        function admin() external view returns (address);
        function oracle() external view returns (address);
        function closeFactorMantissa() external view returns (uint256);
        function liquidationIncentiveMantissa() external view returns (uint256);
        function maxAssets() external view returns (uint256);
        function getAllMarkets() external view returns (address[]);
    }

    /// Price oracle. Every oracle generation exposes the same method; they
    /// differ in which address they expect and how the result is scaled.
    interface IPriceOracle {
        function getUnderlyingPrice(address cToken) external view returns (uint256);
    }
}
